//! Agent configuration validation.

use super::customize::Customization;
use super::definition::{AgentDefinition, RawAgentConfig};
use crate::error::ValidationError;
use crate::resolver::ResourceReference;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 50;

/// Check that an agent name is 3-50 characters of `[A-Za-z0-9_-]`.
pub fn validate_agent_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        return Err(format!(
            "must be {}-{} characters (got {})",
            MIN_NAME_LEN, MAX_NAME_LEN, len
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(format!("contains invalid character '{}'", bad));
    }
    Ok(())
}

/// Validate one raw agent config, collecting every problem found.
///
/// Only syntax is checked here; whether references resolve is left to the
/// resolver at load time.
pub fn validate_agent_config(
    index: usize,
    raw: &RawAgentConfig,
) -> Result<AgentDefinition, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let agent = raw.name.clone();
    let field_error = |field: &'static str, reason: String| ValidationError::InvalidField {
        index,
        agent: agent.clone(),
        field,
        reason,
    };

    if raw.title.trim().is_empty() {
        errors.push(field_error("title", "cannot be empty".to_string()));
    } else if raw.title.chars().count() > MAX_TITLE_LEN {
        errors.push(field_error(
            "title",
            format!("exceeds {} characters", MAX_TITLE_LEN),
        ));
    }

    if let Err(reason) = validate_agent_name(&raw.name) {
        errors.push(field_error("name", reason));
    }

    if raw.description.trim().is_empty() {
        errors.push(field_error("description", "cannot be empty".to_string()));
    } else if raw.description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.push(field_error(
            "description",
            format!("exceeds {} characters", MAX_DESCRIPTION_LEN),
        ));
    }

    let persona_ref = match raw.persona.as_deref() {
        None => {
            errors.push(field_error("persona", "is required".to_string()));
            None
        }
        Some(persona) => match ResourceReference::parse(persona) {
            Ok(reference) => Some(reference),
            Err(source) => {
                errors.push(ValidationError::InvalidReference {
                    index,
                    agent: agent.clone(),
                    field: "persona",
                    reference: persona.to_string(),
                    source,
                });
                None
            }
        },
    };

    if let Some(customize) = &raw.customize {
        if customize.trim().is_empty() {
            errors.push(field_error(
                "customize",
                "cannot be empty if provided".to_string(),
            ));
        } else if let Err(e) = Customization::parse(customize) {
            errors.push(ValidationError::InvalidCustomize {
                index,
                agent: agent.clone(),
                source: e,
            });
        }
    }

    if let Some(parent) = &raw.inherits_from {
        if let Err(reason) = validate_agent_name(parent) {
            errors.push(field_error("inherits_from", reason));
        }
    }

    let mut parse_list = |field: &'static str, raw_refs: &[String]| {
        let mut refs: Vec<ResourceReference> = Vec::with_capacity(raw_refs.len());
        for raw_ref in raw_refs {
            match ResourceReference::parse(raw_ref) {
                Ok(reference) if refs.contains(&reference) => {
                    errors.push(ValidationError::InvalidField {
                        index,
                        agent: agent.clone(),
                        field,
                        reason: format!("lists '{}' more than once", reference),
                    });
                }
                Ok(reference) => refs.push(reference),
                Err(source) => errors.push(ValidationError::InvalidReference {
                    index,
                    agent: agent.clone(),
                    field,
                    reference: raw_ref.clone(),
                    source,
                }),
            }
        }
        refs
    };

    let task_refs = parse_list("tasks", &raw.tasks);
    let template_refs = parse_list("templates", &raw.templates);
    let checklist_refs = parse_list("checklists", &raw.checklists);
    let data_refs = parse_list("data", &raw.data);

    match persona_ref {
        Some(persona_ref) if errors.is_empty() => Ok(AgentDefinition {
            title: raw.title.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            persona_ref,
            customize: raw.customize.clone(),
            task_refs,
            template_refs,
            checklist_refs,
            data_refs,
            inherits_from: raw.inherits_from.clone(),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CustomizeParseError;

    fn raw(name: &str) -> RawAgentConfig {
        RawAgentConfig {
            title: "Product Manager".to_string(),
            name: name.to_string(),
            description: "Owns the PRD".to_string(),
            persona: Some("personas#pm".to_string()),
            tasks: vec!["create-prd.md".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let def = validate_agent_config(0, &raw("john")).unwrap();
        assert_eq!(def.name, "john");
        assert_eq!(def.task_refs.len(), 1);
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_agent_name("pm").is_err());
        assert!(validate_agent_name("a".repeat(51).as_str()).is_err());
        assert!(validate_agent_name("bad name").is_err());
        assert!(validate_agent_name("design_architect-2").is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = raw("x");
        config.title = String::new();
        config.description = "d".repeat(501);
        config.persona = None;
        config.tasks = vec!["no-extension".to_string()];

        let errors = validate_agent_config(3, &config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidReference { field: "tasks", .. })));
        assert!(errors.iter().all(|e| e.agent() == "x"));
    }

    #[test]
    fn test_duplicate_reference_in_list() {
        let mut config = raw("john");
        config.tasks = vec!["a.md".to_string(), "a.md".to_string()];
        let errors = validate_agent_config(0, &config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_customize_checked() {
        let mut config = raw("john");
        config.customize = Some("REPLACE:Style".to_string());
        let errors = validate_agent_config(0, &config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidCustomize {
                source: CustomizeParseError::MissingText { line: 1, .. },
                ..
            }
        ));

        config.customize = Some("  ".to_string());
        assert!(validate_agent_config(0, &config).is_err());

        config.customize = Some("Speak plainly.".to_string());
        assert!(validate_agent_config(0, &config).is_ok());
    }
}
