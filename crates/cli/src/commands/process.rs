//! Process command - run one processor over a file

use anyhow::{Context, Result, bail};
use asset_watch_domain::{
    Resource,
    processors::{self, IgnoreFailures, ResourcePreProcessor},
};
use std::io::Read;

use crate::args::ProcessArgs;

pub async fn execute(args: ProcessArgs) -> Result<()> {
    let Some(processor) = processors::pre_processor(&args.processor) else {
        bail!(
            "Unknown processor '{}'. Available: {}",
            args.processor,
            processors::aliases().join(", ")
        );
    };

    let content = read_input(&args.file)?;
    let uri = args
        .uri
        .unwrap_or_else(|| args.file.to_string_lossy().into_owned());
    let resource = Resource::infer(uri);

    tracing::debug!(processor = %args.processor, resource = %resource, "Processing");

    let output = if args.ignore_failures {
        IgnoreFailures::new(processor).pre_process(&resource, &content)?
    } else {
        processor
            .pre_process(&resource, &content)
            .with_context(|| format!("Processor '{}' failed", args.processor))?
    };

    print!("{}", output);
    Ok(())
}

fn read_input(path: &std::path::Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
