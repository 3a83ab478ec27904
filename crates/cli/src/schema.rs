use codedash_api::models::{FunctionDocument, FunctionStats, ProgressSnapshot, ResultItem};
use schemars::schema_for;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Analysis API contract");
    println!("=====================");

    println!("\n1. GET /stats/progress");
    println!("{}", serde_json::to_string_pretty(&schema_for!(ProgressSnapshot))?);

    println!("\n2. GET /functions?limit=N&include_stats=true (array of)");
    println!("{}", serde_json::to_string_pretty(&schema_for!(FunctionStats))?);

    println!("\n3. GET /search?q=..&limit=N&fuzzy=bool and POST /analyze {{\"stacktrace\": ..}} (array of)");
    println!("{}", serde_json::to_string_pretty(&schema_for!(ResultItem))?);

    println!("\n4. GET /code/{{function_id}}");
    println!("{}", serde_json::to_string_pretty(&schema_for!(FunctionDocument))?);

    Ok(())
}
