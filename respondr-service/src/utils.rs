use rig::{agent::Agent, client::CompletionClient, providers::openrouter};

pub fn get_llm_agent(
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Agent<openrouter::CompletionModel> {
    let client = openrouter::Client::new(api_key);
    client.agent(model).preamble(prompt).build()
}
