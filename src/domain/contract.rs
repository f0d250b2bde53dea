use chrono::{DateTime, Utc};
use regex::Regex;

/// Service contract template shipped with the tool. Studios paste their own
/// text over this; the merge only recognizes the literal labels below.
pub const DEFAULT_CONTRACT_TEMPLATE: &str = "\
CONTRATO DE PRESTAÇÃO DE SERVIÇOS

Nome: ______________________________________
CPF: ______________________________________
Endereço: ______________________________________

O(A) contratante declara ter respondido com veracidade à ficha de anamnese,
estar ciente dos cuidados pré e pós-procedimento que lhe foram explicados e
concordar com a política de remarcação do estúdio.

USO DE IMAGEM: ______________________________________

Assinatura: ______________________________________
";

/// Values spliced into a contract template. Optional fields that are absent
/// leave their placeholder untouched.
#[derive(Debug, Clone)]
pub struct ContractData {
    pub client_name: String,
    pub document: Option<String>,
    pub address: Option<String>,
    /// Whether the client authorized use of their image in studio publicity
    pub image_use_authorized: bool,
}

/// Merge client data into a free-text contract template.
///
/// This is string templating, not a template engine: a fixed, ordered
/// sequence of regular-expression substitutions, each keyed on the literal
/// label text followed by a run of underscores (e.g. a line starting with
/// `Nome: ` and underscores). A template whose wording deviates from a label
/// silently keeps that blank unfilled. No escaping is applied to the spliced
/// values.
///
/// Idempotence holds only per concrete template: every substitution consumes
/// the underscore run it matched, so re-merging the default template is a
/// no-op, but a template whose text could re-introduce a pattern has no such
/// guarantee.
pub fn merge_contract(template: &str, data: &ContractData, now: DateTime<Utc>) -> String {
    let mut merged = template.to_string();

    merged = substitute(
        &merged,
        r"(?m)^(Nome: )_+",
        &format!("${{1}}{}", data.client_name),
    );

    if let Some(document) = &data.document {
        merged = substitute(&merged, r"(?m)^(CPF: )_+", &format!("${{1}}{}", document));
    }

    if let Some(address) = &data.address {
        merged = substitute(
            &merged,
            r"(?m)^(Endereço: )_+",
            &format!("${{1}}{}", address),
        );
    }

    let authorization = if data.image_use_authorized {
        "autorizo a divulgação da minha imagem em materiais do estúdio"
    } else {
        "NÃO autorizo a divulgação da minha imagem"
    };
    merged = substitute(
        &merged,
        r"(?m)^(USO DE IMAGEM: )_+",
        &format!("${{1}}{}", authorization),
    );

    let signature = format!(
        "${{1}}{}\nAssinado em {}",
        data.client_name,
        now.format("%d/%m/%Y %H:%M")
    );
    merged = substitute(&merged, r"(?m)^(Assinatura: )_+", &signature);

    merged
}

// First occurrence only; the blanks are labels, not repeating fields.
fn substitute(text: &str, pattern: &str, replacement: &str) -> String {
    let re = Regex::new(pattern).unwrap();
    re.replace(text, replacement).into_owned()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_data() -> ContractData {
        ContractData {
            client_name: "Maria Silva".into(),
            document: Some("123.456.789-09".into()),
            address: Some("Rua das Flores, 10 - São Paulo".into()),
            image_use_authorized: true,
        }
    }

    fn sample_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_merge_fills_all_blanks() {
        let merged = merge_contract(DEFAULT_CONTRACT_TEMPLATE, &sample_data(), sample_now());

        assert!(merged.contains("Nome: Maria Silva"));
        assert!(merged.contains("CPF: 123.456.789-09"));
        assert!(merged.contains("Endereço: Rua das Flores, 10 - São Paulo"));
        assert!(merged.contains("USO DE IMAGEM: autorizo a divulgação"));
        assert!(merged.contains("Assinatura: Maria Silva"));
        assert!(merged.contains("Assinado em 15/03/2024 14:30"));
        assert!(!merged.contains("____"));
    }

    #[test]
    fn test_merge_without_authorization() {
        let data = ContractData {
            image_use_authorized: false,
            ..sample_data()
        };
        let merged = merge_contract(DEFAULT_CONTRACT_TEMPLATE, &data, sample_now());
        assert!(merged.contains("USO DE IMAGEM: NÃO autorizo"));
    }

    #[test]
    fn test_merge_missing_optional_fields_keep_blanks() {
        let data = ContractData {
            document: None,
            address: None,
            ..sample_data()
        };
        let merged = merge_contract(DEFAULT_CONTRACT_TEMPLATE, &data, sample_now());

        assert!(merged.contains("Nome: Maria Silva"));
        // Blanks stay blank rather than erroring
        assert!(merged.contains("CPF: ____"));
        assert!(merged.contains("Endereço: ____"));
    }

    #[test]
    fn test_merge_deviated_wording_silently_skips() {
        // "Nome completo:" is not the literal label the merge knows, so the
        // blank survives untouched.
        let template = "Nome completo: ____________\nCPF: ____________\n";
        let merged = merge_contract(template, &sample_data(), sample_now());

        assert!(merged.contains("Nome completo: ____________"));
        assert!(merged.contains("CPF: 123.456.789-09"));
    }

    #[test]
    fn test_merge_default_template_is_idempotent() {
        let data = sample_data();
        let now = sample_now();
        let once = merge_contract(DEFAULT_CONTRACT_TEMPLATE, &data, now);
        let twice = merge_contract(&once, &data, now);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_replaces_first_occurrence_only() {
        let template = "Nome: ____\nNome: ____\n";
        let merged = merge_contract(template, &sample_data(), sample_now());
        assert!(merged.contains("Nome: Maria Silva"));
        assert!(merged.contains("Nome: ____"));
    }
}
