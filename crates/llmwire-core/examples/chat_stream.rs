use futures::StreamExt;
use llmwire_core::types::ResponseRequest;
use llmwire_core::{ChatCompletionRequest, LlmClient, Message, identities};
use std::io::Write;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔄 Streaming Example");
    println!("====================\n");

    // Set XAI_API_KEY before running
    let client = LlmClient::from_env(identities::XAI)?;

    // 1. Chat completion stream
    let request = ChatCompletionRequest::new(
        "grok-3-mini",
        vec![
            Message::system("You are a helpful assistant."),
            Message::user("Tell me a short joke about programming."),
        ],
    )
    .temperature(0.7);

    let mut stream = client
        .send_streaming(request, Duration::from_secs(60))
        .await?;

    print!("🤖 Assistant: ");
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                if let Some(content) = chunk.content() {
                    print!("{content}");
                    std::io::stdout().flush()?;
                }
                if let Some(usage) = &chunk.usage {
                    println!("\n📊 {} tokens", usage.total_tokens);
                }
            }
            Err(e) => {
                println!("\n❌ Stream error: {e}");
                break;
            }
        }
    }
    println!("\n✅ Stream completed\n");

    // 2. Responses API stream, abandoned after the first few deltas
    let mut events = client
        .create_response_stream(ResponseRequest::new(
            "grok-3-mini",
            "Count slowly from one to twenty.",
        ))
        .await?;

    print!("🔢 ");
    let mut deltas = 0;
    while let Some(event) = events.next().await {
        if let Some(text) = event?.text_delta() {
            print!("{text}");
            std::io::stdout().flush()?;
            deltas += 1;
        }
        if deltas == 5 {
            events.close();
            println!("\n✋ Stopped early; connection released");
        }
    }

    Ok(())
}
