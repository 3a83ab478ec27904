use codedash_core::router::{SCOPE_SEPARATOR, classify_query};
use codedash_core::{Dashboard, QueryKind};
use std::io::Read;
use std::path::Path;

pub async fn run(dashboard: &Dashboard, file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let trace = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };

    if classify_query(&trace) != Some(QueryKind::StacktraceAnalysis) {
        return Err(format!(
            "Input does not look like a stack trace (no '{}' found)",
            SCOPE_SEPARATOR
        )
        .into());
    }

    crate::search::run(dashboard, &trace, false, json).await
}
