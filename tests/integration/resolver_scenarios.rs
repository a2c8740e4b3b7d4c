use std::fs;
use std::sync::Arc;

use jaegis::error::ResolveError;
use jaegis::resolver::SectionMarkers;
use jaegis::{FsContentStore, MemoryContentStore, ResourceReference, ResourceResolver};
use tempfile::TempDir;

use crate::integration::support::persona_bundle;

#[tokio::test]
async fn missing_pm_section_is_section_not_found() {
    let store = MemoryContentStore::new().with_entry("personas.txt", persona_bundle(&["architect", "analyst"]));
    let resolver = ResourceResolver::new(Arc::new(store));

    let err = resolver
        .resolve(&ResourceReference::parse("personas#pm").unwrap())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ResolveError::SectionNotFound {
            file: "personas.txt".to_string(),
            section: "pm".to_string(),
        }
    );
}

#[tokio::test]
async fn filesystem_store_resolves_sections_and_direct_files() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("tasks")).unwrap();
    fs::write(temp.path().join("personas.txt"), persona_bundle(&["pm", "architect"])).unwrap();
    fs::write(temp.path().join("tasks").join("create-prd.md"), "# Create PRD\n").unwrap();

    let resolver = ResourceResolver::new(Arc::new(FsContentStore::new(temp.path())));

    let pm = resolver
        .resolve(&ResourceReference::parse("personas#pm").unwrap())
        .await
        .unwrap();
    assert_eq!(pm, "You are pm.");

    let task = resolver
        .resolve(&ResourceReference::parse("tasks/create-prd.md").unwrap())
        .await
        .unwrap();
    assert_eq!(task, "# Create PRD\n");

    let missing = resolver
        .resolve(&ResourceReference::parse("tasks/absent.md").unwrap())
        .await
        .unwrap_err();
    assert_eq!(
        missing,
        ResolveError::FileNotFound {
            file: "tasks/absent.md".to_string()
        }
    );
}

#[tokio::test]
async fn filesystem_store_refuses_to_escape_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("content");
    fs::create_dir_all(&root).unwrap();
    fs::write(temp.path().join("secret.md"), "outside").unwrap();

    let resolver = ResourceResolver::new(Arc::new(FsContentStore::new(&root)));
    let err = resolver
        .resolve(&ResourceReference::parse("../secret.md").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Store { .. }));
}

#[tokio::test]
async fn custom_marker_keywords() {
    let markers = SectionMarkers {
        begin_keyword: "BEGIN".to_string(),
        end_keyword: "FINISH".to_string(),
    };
    let bundle = format!(
        "{}\nchecklist body\n{}\n",
        markers.begin_line("qa"),
        markers.end_line("qa")
    );
    let store = MemoryContentStore::new().with_entry("checklists.md", bundle);
    let resolver = ResourceResolver::new(Arc::new(store)).with_markers(markers);

    let body = resolver
        .resolve(&ResourceReference::parse("checklists.md#qa").unwrap())
        .await
        .unwrap();
    assert_eq!(body, "checklist body");
}
