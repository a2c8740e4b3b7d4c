use std::sync::Arc;

use jaegis::error::{InheritanceError, ValidationError};
use jaegis::{AgentContext, AgentRegistry, MemoryContentStore, RawAgentConfig, ResourceResolver};
use proptest::prelude::*;

use crate::integration::support::direct_agent;

fn with_tasks(name: &str, parent: Option<&str>, tasks: &[&str]) -> RawAgentConfig {
    RawAgentConfig {
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
        inherits_from: parent.map(str::to_string),
        ..direct_agent(name)
    }
}

#[test]
fn jane_inherits_base_tasks_in_order() {
    let registry = AgentRegistry::load(vec![
        with_tasks("Base", None, &["t1.md"]),
        with_tasks("Jane", Some("Base"), &["t2.md"]),
    ])
    .unwrap();

    let jane = registry.resolve_inheritance("Jane").unwrap();
    let tasks: Vec<String> = jane.task_refs.iter().map(|r| r.to_string()).collect();
    assert_eq!(tasks, vec!["t1.md", "t2.md"]);
    assert_eq!(jane.name, "Jane");
    assert_eq!(jane.inherits_from.as_deref(), Some("Base"));
}

#[test]
fn mutual_inheritance_is_rejected_for_both_agents() {
    let registry = AgentRegistry::load(vec![
        with_tasks("alpha", Some("beta"), &[]),
        with_tasks("beta", Some("alpha"), &[]),
    ])
    .unwrap();
    for name in ["alpha", "beta"] {
        assert!(matches!(
            registry.resolve_inheritance(name),
            Err(InheritanceError::CircularInheritance { .. })
        ));
    }
}

#[tokio::test]
async fn child_without_customize_uses_parent_directives() {
    let registry = AgentRegistry::load(vec![
        RawAgentConfig {
            customize: Some("REPLACE:Style:Terse answers only.".to_string()),
            ..direct_agent("base")
        },
        RawAgentConfig {
            persona: Some("base.md".to_string()),
            inherits_from: Some("base".to_string()),
            ..direct_agent("child")
        },
    ])
    .unwrap();
    let store = MemoryContentStore::new().with_entry("base.md", "# Base\n## Style\nVerbose.\n");
    let resolver = ResourceResolver::new(Arc::new(store));

    let context = AgentContext::build("child", &registry, &resolver).await.unwrap();
    assert!(context.persona_content.contains("Terse answers only."));
    assert!(!context.persona_content.contains("Verbose."));
}

fn agent_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{2,12}"
}

proptest! {
    #[test]
    fn duplicate_names_register_nothing(
        names in prop::collection::hash_set(agent_name(), 2..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let duplicate = pick.get(&names).clone();
        let mut raw: Vec<RawAgentConfig> = names.iter().map(|n| direct_agent(n)).collect();
        raw.push(direct_agent(&duplicate));

        let errors = AgentRegistry::load(raw).unwrap_err();
        let reports_duplicate = errors.iter().any(|e| matches!(
            e,
            ValidationError::DuplicateName { name, .. } if *name == duplicate
        ));
        prop_assert!(reports_duplicate);
    }

    #[test]
    fn inheritance_resolution_is_idempotent(
        task_lists in prop::collection::vec(
            prop::collection::vec(0usize..6, 0..5),
            1..6,
        ),
    ) {
        let names: Vec<String> = (0..task_lists.len()).map(|i| format!("agent-{}", i)).collect();
        let raw: Vec<RawAgentConfig> = task_lists
            .iter()
            .enumerate()
            .map(|(i, tasks)| {
                let mut seen = std::collections::HashSet::new();
                let tasks: Vec<String> = tasks
                    .iter()
                    .filter(|t| seen.insert(**t))
                    .map(|t| format!("t{}.md", t))
                    .collect();
                RawAgentConfig {
                    tasks,
                    inherits_from: (i > 0).then(|| names[i - 1].clone()),
                    ..direct_agent(&names[i])
                }
            })
            .collect();
        let registry = AgentRegistry::load(raw).unwrap();
        let leaf = names.last().unwrap();

        let first = registry.resolve_inheritance(leaf).unwrap();
        let second = registry.resolve_inheritance(leaf).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(format!("{:?}", first), format!("{:?}", second));

        let mut unique = std::collections::HashSet::new();
        prop_assert!(first.task_refs.iter().all(|r| unique.insert(r.to_string())));

        let parent = registry.resolve_inheritance(&names[0]).unwrap();
        prop_assert_eq!(first.merge_with_parent(&parent), first.clone());
    }
}
