use chrono::Local;
use ranktrack::{info_time, process, Error, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.split_first() {
        Some((cmd, rest)) if cmd == "analyze" => match rest {
            [query, text_path] => process::run_analysis(query, text_path, "us").await?,
            [query, text_path, locale] => process::run_analysis(query, text_path, locale).await?,
            _ => return Err(Error::Usage("ranktrack analyze <query> <draft.txt> [locale]")),
        },
        Some((domain, keywords)) if !keywords.is_empty() => {
            let locale = std::env::var("RANK_LOCALE").unwrap_or_else(|_| "us".into());
            process::run_tracking(domain, keywords, &locale).await?;
        }
        _ => {
            return Err(Error::Usage(
                "ranktrack <domain> <keyword>...  |  ranktrack analyze <query> <draft.txt> [locale]",
            ))
        }
    }

    info_time!(start_time, "Full program time:");
    Ok(())
}
