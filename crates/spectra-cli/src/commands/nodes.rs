//! Node kind listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use spectra_graph::{NodeKind, PortSpec};

/// List the node kinds a pipeline may use.
#[derive(Args)]
pub struct NodesArgs {
    /// Show ports for a single kind
    #[arg(value_name = "KIND")]
    kind: Option<String>,
}

/// Run the nodes command.
pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let kinds: Vec<NodeKind> = match &args.kind {
        Some(name) => {
            let kind = NodeKind::from(name.as_str());
            if let NodeKind::Unknown(name) = &kind {
                anyhow::bail!("Unknown node kind: {name}. Run 'spectra nodes' to list kinds.");
            }
            vec![kind]
        }
        None => NodeKind::ALL.to_vec(),
    };

    println!("  {:18}  {:10}  {:20}  {}", "Kind", "Category", "Inputs", "Outputs");
    println!("  {:18}  {:10}  {:20}  {}", "----", "--------", "------", "-------");
    for kind in kinds {
        println!(
            "  {:18}  {:10}  {:20}  {}",
            kind.name(),
            format!("{:?}", kind.category()),
            ports(kind.inputs()),
            ports(kind.outputs())
        );
    }
    Ok(())
}

fn ports(specs: &[PortSpec]) -> String {
    if specs.is_empty() {
        return "-".to_string();
    }
    specs
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect::<Vec<_>>()
        .join(", ")
}
