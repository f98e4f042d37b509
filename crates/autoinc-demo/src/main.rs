mod config;

use std::{collections::HashSet, sync::Arc};

use anyhow::ensure;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use autoinc_core::{GeneratorContext, SequenceGenerator};
use autoinc_observe::init_logger;
use autoinc_prometheus::{PrometheusMetrics, TextEncoder};

use crate::config::DemoConfig;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) config
    let cfg = match std::env::args().nth(1) {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };

    // 2) logger
    init_logger(&cfg.logger)?;
    info!("logger initialized");

    // 3) generator wired to metrics and a process-level shutdown token
    let metrics = PrometheusMetrics::new()?;
    let shutdown = CancellationToken::new();
    let ctx = GeneratorContext::default()
        .with_metrics(Arc::new(metrics.clone()))
        .with_cancel_token(shutdown.clone());
    let ids = Arc::new(SequenceGenerator::spawn(&cfg.generator, &ctx)?);

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; cancelling generators");
                shutdown.cancel();
            }
        }
    });

    // 4) consumers
    let mut consumers = JoinSet::new();
    for worker in 0..cfg.consumers {
        let ids = Arc::clone(&ids);
        let wanted = cfg.per_consumer;
        consumers.spawn(async move {
            let mut taken = Vec::with_capacity(wanted);
            while taken.len() < wanted {
                match ids.next().await {
                    Some(value) => taken.push(value),
                    None => break,
                }
            }
            (worker, taken)
        });
    }

    let mut seen = HashSet::new();
    while let Some(joined) = consumers.join_next().await {
        let (worker, taken) = joined?;
        debug!(worker, count = taken.len(), "consumer finished");
        for value in taken {
            ensure!(seen.insert(value), "value {value} delivered twice");
        }
    }
    info!(unique = seen.len(), "all consumers finished");

    // 5) shutdown and drain
    let reason = ids.shutdown().await?;
    let mut leftover = 0usize;
    while ids.next().await.is_some() {
        leftover += 1;
    }
    info!(%reason, leftover, "generator stopped");

    // 6) metrics
    println!("{}", TextEncoder::new().encode_to_string(&metrics.gather())?);
    Ok(())
}
