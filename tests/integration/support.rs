use jaegis::resolver::SectionMarkers;
use jaegis::RawAgentConfig;

/// Minimal valid agent whose persona lives in `<name>.md`.
pub fn direct_agent(name: &str) -> RawAgentConfig {
    RawAgentConfig {
        title: format!("{} title", name),
        name: name.to_string(),
        description: format!("{} description", name),
        persona: Some(format!("{}.md", name)),
        ..Default::default()
    }
}

/// Agent whose persona is a section of the `personas` bundle.
pub fn bundled_agent(name: &str) -> RawAgentConfig {
    RawAgentConfig {
        persona: Some(format!("personas#{}", name)),
        ..direct_agent(name)
    }
}

/// Bundle file with one `You are <name>.` section per name.
pub fn persona_bundle(names: &[&str]) -> String {
    let markers = SectionMarkers::default();
    names
        .iter()
        .map(|name| {
            format!(
                "{}\nYou are {}.\n{}\n",
                markers.begin_line(name),
                name,
                markers.end_line(name)
            )
        })
        .collect()
}
