//! `errorkube facets`: distinct namespaces and object kinds in the snapshot.

use crate::cmd::Sources;
use crate::output::{OutputMode, pretty_section, render_mode};
use clap::Args;
use errorkube_core::FilterState;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct FacetsArgs {
    /// Only list kinds seen in this namespace.
    #[arg(short, long)]
    pub namespace: Option<String>,
}

/// The two distinct-value queries, in first-seen order.
#[derive(Debug, Serialize)]
pub struct Facets {
    pub namespaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub kinds: Vec<String>,
}

/// Execute `errorkube facets`.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or output fails.
pub fn run_facets(args: &FacetsArgs, output: OutputMode, sources: &Sources) -> anyhow::Result<()> {
    let mut filter = FilterState::default();
    filter.set_namespace(args.namespace.clone());
    let session = sources.load_session(filter)?;

    let facets = Facets {
        namespaces: session.namespaces(),
        namespace: session.filter().namespace.clone(),
        kinds: session.kinds(),
    };
    render_mode(
        output,
        &facets,
        |f, w| render_facets_text(f, w),
        |f, w| render_facets_human(f, w),
    )
}

fn render_facets_text(facets: &Facets, w: &mut dyn Write) -> std::io::Result<()> {
    for namespace in &facets.namespaces {
        writeln!(w, "namespace  {namespace}")?;
    }
    for kind in &facets.kinds {
        writeln!(w, "kind  {kind}")?;
    }
    Ok(())
}

fn render_facets_human(facets: &Facets, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Namespaces ({})", facets.namespaces.len()))?;
    for namespace in &facets.namespaces {
        writeln!(w, "  {namespace}")?;
    }
    writeln!(w)?;
    let heading = match facets.namespace {
        Some(ref ns) => format!("Kinds in {ns} ({})", facets.kinds.len()),
        None => format!("Kinds ({})", facets.kinds.len()),
    };
    pretty_section(w, &heading)?;
    for kind in &facets.kinds {
        writeln!(w, "  {kind}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facets() -> Facets {
        Facets {
            namespaces: vec!["default".into(), "kube-system".into()],
            namespace: Some("default".into()),
            kinds: vec!["Pod".into()],
        }
    }

    #[test]
    fn text_lists_one_value_per_line() {
        let mut buf = Vec::new();
        render_facets_text(&facets(), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "namespace  default\nnamespace  kube-system\nkind  Pod\n"
        );
    }

    #[test]
    fn pretty_names_the_scoped_namespace() {
        let mut buf = Vec::new();
        render_facets_human(&facets(), &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Namespaces (2)"));
        assert!(out.contains("Kinds in default (1)"));
    }

    #[test]
    fn json_omits_unscoped_namespace() {
        let mut unscoped = facets();
        unscoped.namespace = None;
        let value = serde_json::to_value(&unscoped).unwrap();
        assert!(value.get("namespace").is_none());
        assert_eq!(value["kinds"], serde_json::json!(["Pod"]));
    }
}
