use llmwire_core::types::{ImageGenerationRequest, ImageResponseFormat, ReasoningEffort};
use llmwire_core::{ChatCompletionRequest, LlmClient, LlmError, Message, identities};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🤖 xAI Chat Example");
    println!("===================\n");

    // 1. Configuration from environment
    // Set XAI_API_KEY (and optionally XAI_BASE_URL) before running
    let client = LlmClient::from_env(identities::XAI)?;

    // 2. Available models
    let models = client.list_models().await?;
    println!("📋 Models: {}\n", models.ids().join(", "));

    // 3. One-shot chat
    let request = ChatCompletionRequest::new(
        "grok-3-mini",
        vec![
            Message::system("You are terse."),
            Message::user("What is the capital of Norway?"),
        ],
    )
    .reasoning_effort(ReasoningEffort::Low)
    .max_tokens(200);

    let response = client.chat_completion(request).await?;
    println!("💬 {}", response.content().unwrap_or("<no content>"));
    if let Some(usage) = &response.usage {
        println!(
            "📊 Tokens: {} prompt, {} completion",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    // 4. Image generation
    let image = ImageGenerationRequest::new("grok-2-image", "a lighthouse at dusk")
        .response_format(ImageResponseFormat::Url);
    match client.generate_image(image).await {
        Ok(images) => {
            for data in images.data {
                println!("🖼️  {}", data.url.unwrap_or_default());
            }
        }
        Err(LlmError::Api { status, message, .. }) => {
            println!("❌ Image generation rejected ({status}): {message:?}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
