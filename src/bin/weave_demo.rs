//! A small CLI that exercises the algebra end to end: apply a couple of
//! edits, rebase one against the other, and print both the shared and the
//! per-site results.

use clap::Parser;
use tracing::{info, info_span};

use weave::document::Document;
use weave::op::{BaseOperation, ConflictlessContext};
use weave::sequence;
use weave::Operation;

#[derive(Parser, Debug)]
#[command(name = "weave-demo", about = "Rebase two concurrent edits to a string")]
struct Args {
    /// Starting document content.
    #[arg(long, default_value = "hello")]
    base: String,

    /// Resolve rebase conflicts deterministically instead of reporting them.
    #[arg(long)]
    conflictless: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let span = info_span!("weave_demo", base = %args.base, conflictless = args.conflictless);
    let _enter = span.enter();

    let base = Document::string(&args.base);
    let local = sequence::splice(0, 0, Document::string(">> "));
    let remote = sequence::splice(args.base.chars().count(), 0, Document::string(" <<"));

    info!(op = %local, "local edit");
    info!(op = %remote, "remote edit");

    let ctx = args.conflictless.then(|| ConflictlessContext::new(base.clone()));
    match local.rebase(&remote, ctx.as_ref()) {
        Ok(rebased) => {
            let after_remote = remote.apply(&base).expect("remote applies to base");
            let converged = rebased.apply(&after_remote).expect("rebased applies after remote");
            info!(result = %converged, "converged document");
            println!("{converged}");
        }
        Err(_) => {
            println!("conflict: rerun with --conflictless to force a deterministic resolution");
        }
    }
}
