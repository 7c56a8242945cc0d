//! # CRD Generator
//!
//! Generates Kubernetes CustomResourceDefinition (CRD) YAML from the Rust
//! type definitions in the library.
//!
//! ## Usage
//!
//! ```bash
//! # Generate both CRDs
//! cargo run --bin crdgen > config/crd/crds.yaml
//!
//! # Generate one CRD and apply directly
//! cargo run --bin crdgen -- --kind email | kubectl apply -f -
//! ```
//!
//! The generated CRDs include:
//! - OpenAPI schema validation
//! - Printer columns for `kubectl get`
//! - Status subresource

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hermes_mail_controller::crd::{Email, EmailSenderConfig};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::CustomResourceExt;

/// Hermes CRD generator
#[derive(Parser)]
#[command(name = "crdgen", about = "Print the Hermes CustomResourceDefinitions as YAML")]
struct Cli {
    /// Which CRD to print
    #[arg(short, long, value_enum, default_value_t = CrdKind::All)]
    kind: CrdKind,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CrdKind {
    /// Email (email.hermes.sender/v1)
    Email,
    /// EmailSenderConfig (email.hermes.sender/v1)
    SenderConfig,
    /// Both CRDs as a multi-document stream
    All,
}

impl CrdKind {
    fn crds(self) -> Vec<CustomResourceDefinition> {
        match self {
            CrdKind::Email => vec![Email::crd()],
            CrdKind::SenderConfig => vec![EmailSenderConfig::crd()],
            CrdKind::All => vec![EmailSenderConfig::crd(), Email::crd()],
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    println!("# Change the types in src/crd/ and regenerate instead");
    for crd in cli.kind.crds() {
        let yaml = serde_yaml::to_string(&crd).context("Failed to serialize CRD to YAML")?;
        println!("---");
        print!("{yaml}");
    }

    Ok(())
}
