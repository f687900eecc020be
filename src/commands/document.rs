//! Document commands: print or replace one category.

use pantry::{Category, SessionContext};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn get(ctx: &SessionContext, category: Category) -> CommandResult {
    let data = ctx.load(category).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Replaces a category with the JSON in `file` (`-` reads stdin).
pub async fn put(ctx: &SessionContext, category: Category, file: &Path) -> CommandResult {
    let contents = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };

    let data = parse_document(&contents)?;
    ctx.save(category, &data).await?;

    println!("Saved {}.", category);
    Ok(())
}

fn parse_document(contents: &str) -> Result<Value, String> {
    let data: Value =
        serde_json::from_str(contents).map_err(|e| format!("Invalid JSON: {}", e))?;
    if data.is_null() {
        return Err("Refusing to save null; use [] or {} to clear a category".to_string());
    }
    Ok(data)
}
