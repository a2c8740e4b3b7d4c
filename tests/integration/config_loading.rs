use std::fs;
use std::sync::Arc;

use jaegis::resolver::ResourceKind;
use jaegis::workflow::{requires_deliverable, TransitionTarget};
use jaegis::{Artifact, ConfigLoader, CriterionTable, Orchestrator};
use tempfile::TempDir;

use crate::integration::support::persona_bundle;

const WORKSPACE_TOML: &str = r#"
[context]
max_bytes = 1024

[resolver]
content_root = "content"

[[agents]]
title = "Product Manager"
name = "john"
description = "Turns the concept into a PRD"
persona = "personas#john"
tasks = ["tasks/create-prd.md"]
customize = "APPEND:Rules:Always cite the concept doc."

[[agents]]
title = "Architect"
name = "fred"
description = "Designs the system"
persona = "personas#fred"
inherits_from = "john"

[[phases]]
name = "Modeling"
primary_agent = "john"
exit_criteria = ["prd recorded"]

[[phases.deliverables]]
name = "prd"

[[phases]]
name = "Architecture"
primary_agent = "fred"
"#;

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let content = temp.path().join("content");
    fs::create_dir_all(content.join("tasks")).unwrap();
    fs::write(content.join("personas.txt"), persona_bundle(&["john", "fred"])).unwrap();
    fs::write(content.join("tasks").join("create-prd.md"), "Write the PRD.").unwrap();
    fs::write(temp.path().join("jaegis.toml"), WORKSPACE_TOML).unwrap();
    temp
}

#[tokio::test]
async fn workspace_config_drives_a_full_session() {
    let temp = workspace();
    let config = ConfigLoader::load(temp.path()).unwrap();
    let store = config.content_store(temp.path()).unwrap().unwrap();
    let evaluator = CriterionTable::new().with("prd recorded", requires_deliverable("Modeling", "prd"));
    let mut orchestrator =
        Orchestrator::from_config(&config, Arc::new(store), Arc::new(evaluator)).unwrap();
    assert_eq!(orchestrator.contexts().max_bytes(), 1024);

    orchestrator.start().unwrap();
    let john = orchestrator.activate_agent("john").await.unwrap();
    assert_eq!(
        john.persona_content,
        "You are john.\n\n## Rules\nAlways cite the concept doc."
    );
    assert_eq!(john.resources(ResourceKind::Task), &["Write the PRD.".to_string()]);

    orchestrator
        .submit_deliverable("Modeling", "prd", Artifact::new("PRD").produced_by("john"))
        .unwrap();
    let transition = orchestrator.advance_phase().unwrap();
    assert_eq!(transition.to, TransitionTarget::Phase("Architecture".to_string()));
    assert!(!orchestrator.contexts().contains("john"));

    // fred inherits john's task and customization
    let fred = orchestrator.activate_agent("fred").await.unwrap();
    assert!(fred.persona_content.starts_with("You are fred."));
    assert!(fred.persona_content.contains("Always cite the concept doc."));
    assert_eq!(fred.resources(ResourceKind::Task).len(), 1);
}
