mod cli;

use crate::cli::CLI;
use clap::Parser;
use serde::Serialize;
use showroom_cache::MokaResolutionCache;
use showroom_core::{MediaEndpoint, MediaReference, ResolvedUrl};
use showroom_resolver::{BlobUrlResolver, HttpMediaFetcher, ViewScope};
use showroom_telemetry::TelemetryConfig;
use tracing::info;

/// One output line per resolved reference.
///
/// Local handles only live as long as this process, so their URL is not
/// printed; the byte count is reported instead.
#[derive(Debug, Serialize)]
struct Report<'a> {
    reference: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::try_parse()?;

    showroom_telemetry::init(
        &TelemetryConfig::builder()
            .format(config.log_format.into())
            .build(),
    )?;

    info!(
        base_endpoint = %config.base_endpoint,
        log_format = %config.log_format,
        references = config.references.len(),
        "resolving media references"
    );

    let endpoint = MediaEndpoint::builder()
        .base_url(config.base_endpoint)
        .access_token(config.access_token)
        .build();
    let references: Vec<MediaReference> = config
        .references
        .iter()
        .map(|r| MediaReference::new(r.as_str()))
        .collect();

    let fetcher = HttpMediaFetcher::new(endpoint.clone())?;
    let scope = ViewScope::mount(MokaResolutionCache::with_initial_capacity(references.len()));
    let resolver = BlobUrlResolver::new(endpoint, fetcher, scope);
    let resolved = resolver.resolve_batch(&references).await;

    for (reference, resolved) in references.iter().zip(&resolved) {
        let report = match resolved {
            ResolvedUrl::Local(handle) => {
                let media = resolver.scope().handles().lookup(handle);
                Report {
                    reference: reference.as_str(),
                    kind: resolved.kind(),
                    url: None,
                    bytes: media.as_ref().map(|m| m.len()),
                    content_type: media.and_then(|m| m.content_type),
                }
            }
            other => Report {
                reference: reference.as_str(),
                kind: other.kind(),
                url: Some(other.as_str()),
                bytes: None,
                content_type: None,
            },
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    resolver.unmount().await;
    Ok(())
}
