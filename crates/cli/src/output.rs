use corpus_indexer::IndexStats;
use corpus_vector_store::{SearchHit, StoreStats};
use serde::Serialize;
use serde_json::json;

const SNIPPET_CHARS: usize = 200;

#[derive(Serialize)]
pub struct SearchOutput<'a> {
    pub query: &'a str,
    pub k: usize,
    pub hits: Vec<SearchHit>,
}

/// `{"status":"ok","data":...}` on stdout
pub fn print_ok<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "status": "ok", "data": data }))?
    );
    Ok(())
}

/// `{"status":"error","message":...}` on stdout, for callers parsing JSON
pub fn print_error(err: &anyhow::Error) {
    let body = json!({ "status": "error", "message": format!("{err:#}") });
    match serde_json::to_string_pretty(&body) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{{\"status\":\"error\"}}"),
    }
}

pub fn render_index_stats(verb: &str, stats: &IndexStats) {
    println!(
        "{verb} {} documents into {} chunks in {} ms",
        stats.documents, stats.chunks, stats.time_ms
    );
    for error in &stats.errors {
        eprintln!("  skipped: {error}");
    }
}

pub fn render_hits(output: &SearchOutput<'_>) {
    if output.hits.is_empty() {
        println!("No results for '{}'", output.query);
        return;
    }
    for (i, hit) in output.hits.iter().enumerate() {
        println!(
            "{}. {} (similarity: {:.3})",
            i + 1,
            hit.chunk.title,
            hit.similarity
        );
        println!("   URL: {}", hit.chunk.url);
        println!("   {}", snippet(&hit.chunk.chunk_text));
        println!();
    }
}

pub fn render_store_stats(stats: &StoreStats) {
    println!("Total chunks:      {}", stats.total_chunks);
    println!("Unique documents:  {}", stats.unique_documents);
    println!("Total words:       {}", stats.total_words);
    println!("Avg chunk length:  {:.1} words", stats.average_chunk_length);
    println!("Next chunk id:     {}", stats.next_chunk_id);
    println!("Embedding dim:     {}", stats.embedding_dimension);
    println!("Model:             {}", stats.model_name);
    if stats.degraded {
        println!("WARNING: embeddings are degraded (stub mode)");
    }
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    format!("{cut}...")
}
