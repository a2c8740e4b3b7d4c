use std::sync::Arc;

use jaegis::error::{AdvanceError, DeliverableError, OrchestratorError};
use jaegis::workflow::{DeliverableSpec, SessionState, TransitionTarget};
use jaegis::{
    Artifact, CriterionTable, JaegisConfig, MemoryContentStore, Orchestrator, PhaseDefinition,
    PhaseStateMachine, Workflow, WorkflowSession,
};
use proptest::prelude::*;

use crate::integration::support::{bundled_agent, persona_bundle};

fn concept_orchestrator() -> Orchestrator {
    let config = JaegisConfig {
        agents: vec![bundled_agent("John")],
        phases: vec![
            PhaseDefinition::new("Brainstorming", "John").with_exit_criterion("hasConceptDoc"),
            PhaseDefinition::new("Development", "John"),
        ],
        ..Default::default()
    };
    let store = MemoryContentStore::new().with_entry("personas.txt", persona_bundle(&["John"]));
    let evaluator = |session: &WorkflowSession, criterion: &str| -> Result<bool, String> {
        match criterion {
            "hasConceptDoc" => Ok(session.has_deliverable("Brainstorming", "concept")),
            other => Err(format!("unknown criterion {}", other)),
        }
    };
    Orchestrator::from_config(&config, Arc::new(store), Arc::new(evaluator)).unwrap()
}

#[tokio::test]
async fn concept_doc_gates_brainstorming_exit() {
    let mut orchestrator = concept_orchestrator();
    assert_eq!(orchestrator.start().unwrap(), "Brainstorming");

    let context = orchestrator.activate_agent("John").await.unwrap();
    assert_eq!(context.persona_content, "You are John.");

    match orchestrator.advance_phase().unwrap_err() {
        OrchestratorError::Advance(err) => assert_eq!(err.failed_criteria(), vec!["hasConceptDoc"]),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(orchestrator.status().current_phase.as_deref(), Some("Brainstorming"));

    orchestrator
        .submit_deliverable("Brainstorming", "concept", Artifact::new("A concept").produced_by("John"))
        .unwrap();
    let transition = orchestrator.advance_phase().unwrap();
    assert_eq!(transition.to, TransitionTarget::Phase("Development".to_string()));
    assert_eq!(orchestrator.status().current_phase.as_deref(), Some("Development"));

    // John is carried into Development, so his context stays cached
    assert!(orchestrator.contexts().contains("John"));

    let transition = orchestrator.advance_phase().unwrap();
    assert_eq!(transition.to, TransitionTarget::Completed);
    assert_eq!(orchestrator.status().state, SessionState::Completed);
    assert_eq!(orchestrator.session().phase_history().len(), 2);
}

#[test]
fn completed_phase_rejects_late_deliverables() {
    let mut orchestrator = concept_orchestrator();
    orchestrator.start().unwrap();
    orchestrator
        .submit_deliverable("Brainstorming", "concept", Artifact::new("A concept"))
        .unwrap();
    orchestrator.advance_phase().unwrap();

    let err = orchestrator
        .submit_deliverable("Brainstorming", "concept", Artifact::new("revised"))
        .unwrap_err();
    assert_eq!(
        err,
        OrchestratorError::Deliverable(DeliverableError::WrongPhase {
            requested: "Brainstorming".to_string(),
            current: Some("Development".to_string()),
        })
    );
    assert_eq!(
        orchestrator
            .session()
            .deliverable("Brainstorming", "concept")
            .unwrap()
            .content,
        "A concept"
    );
}

#[test]
fn panicking_criterion_fails_closed() {
    let workflow = Workflow::new(vec![
        PhaseDefinition::new("Modeling", "john").with_exit_criterion("approved"),
        PhaseDefinition::new("Architecture", "fred"),
    ])
    .unwrap();
    let evaluator = |_: &WorkflowSession, _: &str| -> Result<bool, String> {
        panic!("approval service crashed")
    };
    let machine = PhaseStateMachine::new(workflow, Arc::new(evaluator));
    let mut session = machine.new_session();
    machine.start(&mut session).unwrap();

    let err = machine.attempt_advance(&mut session).unwrap_err();
    assert!(matches!(err, AdvanceError::CriteriaNotMet { .. }));
    assert_eq!(err.failed_criteria(), vec!["approved"]);
    assert_eq!(session.current_phase(), Some("Modeling"));
}

/// Linear workflow of `len` phases, each requiring a deliverable named
/// after it and gated by one table criterion.
fn gated_machine(len: usize) -> PhaseStateMachine {
    let names: Vec<String> = (0..len).map(|i| format!("phase-{}", i)).collect();
    let phases = names
        .iter()
        .map(|name| {
            PhaseDefinition::new(name.clone(), "agent")
                .with_exit_criterion(format!("{} reviewed", name))
                .with_deliverable(DeliverableSpec::required(name.clone()))
        })
        .collect();
    let mut table = CriterionTable::new();
    for name in &names {
        let phase = name.clone();
        table.insert(format!("{} reviewed", name), move |session: &WorkflowSession| {
            Ok(session.has_deliverable(&phase, &phase))
        });
    }
    PhaseStateMachine::new(Workflow::new(phases).unwrap(), Arc::new(table))
}

#[derive(Debug, Clone)]
enum Op {
    Record { phase: usize },
    Advance,
    Abort,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0usize..5).prop_map(|phase| Op::Record { phase }),
        6 => Just(Op::Advance),
        1 => Just(Op::Abort),
    ]
}

proptest! {
    #[test]
    fn history_is_append_only_and_advances_in_order(len in 1usize..5, ops in prop::collection::vec(op(), 0..30)) {
        let machine = gated_machine(len);
        let mut session = machine.new_session();
        machine.start(&mut session).unwrap();

        for op in ops {
            let history_before = session.phase_history().to_vec();
            let phase_before = session.current_phase().map(str::to_string);
            match op {
                Op::Record { phase } => {
                    let target = format!("phase-{}", phase);
                    let result = machine.record_deliverable(&mut session, &target, &target, Artifact::new("x"));
                    if phase_before.as_deref() != Some(target.as_str()) {
                        let is_wrong_phase = matches!(result, Err(DeliverableError::WrongPhase { .. }));
                        prop_assert!(is_wrong_phase);
                    } else {
                        prop_assert!(result.is_ok());
                    }
                }
                Op::Advance => {
                    let result = machine.attempt_advance(&mut session);
                    prop_assert!(session.phase_history().len() >= history_before.len());
                    match result {
                        Ok(transition) => {
                            let expected = machine
                                .workflow()
                                .successor(&transition.from)
                                .map(|p| TransitionTarget::Phase(p.name.clone()))
                                .unwrap_or(TransitionTarget::Completed);
                            prop_assert_eq!(transition.to, expected);
                        }
                        Err(_) => {
                            prop_assert_eq!(session.phase_history(), history_before.as_slice());
                            prop_assert_eq!(session.current_phase().map(str::to_string), phase_before.clone());
                        }
                    }
                }
                Op::Abort => {
                    machine.abort(&mut session, "random abort");
                }
            }
            prop_assert!(session.phase_history().len() >= history_before.len());
            for (i, record) in history_before.iter().enumerate() {
                prop_assert_eq!(&session.phase_history()[i].phase, &record.phase);
                prop_assert_eq!(session.phase_history()[i].entered_at, record.entered_at);
            }
            let open = session.phase_history().iter().filter(|r| r.is_open()).count();
            prop_assert!(open <= 1);
            prop_assert_eq!(open == 1, session.current_phase().is_some());
        }
    }
}
