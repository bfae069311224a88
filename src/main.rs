// Copyright 2020 Boban Acimovic
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

#[macro_use]
extern crate log;

mod cert;
mod client;
mod crd;
mod error;
mod expiry;
mod finding;
mod reconciler;
mod scanner;
#[cfg(test)]
mod testing;
mod writer;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};

use crate::client::{KubeApi, Scope};
use crate::scanner::{FailurePolicy, Scanner};
use crate::writer::{OutputFormat, Writer};

/// Report Kubernetes TLS secrets that are expired or about to expire
#[derive(Parser, Debug)]
#[command(name = "certcheck", version)]
struct Opt {
    /// Path to the kubeconfig file, defaults to in-cluster or ~/.kube/config
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    context: Option<String>,

    /// Namespace to query, all namespaces when omitted
    #[arg(short, long)]
    namespace: Option<String>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Report secrets that cannot be inspected and carry on
    #[arg(long)]
    keep_going: bool,

    /// Abort the scan after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Disable coloured text output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let opt = Opt::parse();
    debug!("Options: {:#?}", opt);

    let client = kube_client(&opt).await?;
    let scanner = Scanner::with_system_clock(KubeApi::new(client));
    let scope = Scope::from_namespace(opt.namespace.clone());
    let policy = if opt.keep_going {
        FailurePolicy::Isolate
    } else {
        FailurePolicy::FailFast
    };

    let scan = scanner.scan_with(&scope, policy);
    let report = match opt.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), scan)
            .await
            .with_context(|| format!("scan of {} did not finish within {}s", scope, secs))??,
        None => scan.await?,
    };

    let color = !opt.no_color && std::io::stdout().is_terminal();
    let stdout = std::io::stdout();
    writer::new_writer(opt.output, color).write(&report.findings, &mut stdout.lock())?;

    for failure in &report.failures {
        error!(
            "could not inspect secret {}/{}: {}",
            failure.namespace, failure.secret_name, failure.error
        );
    }
    if !report.failures.is_empty() {
        bail!("{} secret(s) could not be inspected", report.failures.len());
    }
    Ok(())
}

async fn kube_client(opt: &Opt) -> anyhow::Result<Client> {
    let options = KubeConfigOptions {
        context: opt.context.clone(),
        ..KubeConfigOptions::default()
    };

    let config = match &opt.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &options).await?
        }
        None if opt.context.is_some() => Config::from_kubeconfig(&options).await?,
        None => Config::infer().await?,
    };

    Client::try_from(config).context("failed to create Kubernetes client")
}
