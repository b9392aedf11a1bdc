//! Recipe generation: prompt, run, poll, parse, with a fixed attempt budget.

use std::sync::Arc;
use thiserror::Error;
use tokio::time::error::Elapsed;
use tokio::time::{timeout_at, Instant};

use crate::ai::prompts::render_recipe_prompt;
use crate::ai::{await_completion, AiError, AssistantClient, PollPolicy, RunStatus};
use crate::parse::{parse_recipe, ParseError};
use crate::types::StructuredRecipe;

#[derive(Error, Debug, Clone)]
pub enum GenerateError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Failed to generate a valid recipe after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl GenerateError {
    /// Missing configuration cannot be fixed by trying again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerateError::Ai(AiError::Config(_)))
    }

    pub fn is_config(&self) -> bool {
        !self.is_retryable()
    }
}

/// Drives prompt -> submit -> poll -> fetch -> parse, retrying failed attempts.
#[derive(Clone)]
pub struct RecipeGenerator {
    client: Arc<dyn AssistantClient>,
    poll: PollPolicy,
    max_attempts: u32,
}

impl RecipeGenerator {
    pub fn new(client: Arc<dyn AssistantClient>, poll: PollPolicy, max_attempts: u32) -> Self {
        Self {
            client,
            poll,
            max_attempts,
        }
    }

    /// Generate a recipe for a raw user request.
    ///
    /// Every failure except configuration errors is retried, with no delay
    /// between attempts. The error of the final attempt is returned.
    pub async fn generate(
        &self,
        request: &str,
        on_status: &(dyn Fn(&RunStatus) + Send + Sync),
    ) -> Result<StructuredRecipe, GenerateError> {
        for attempt in 1..=self.max_attempts {
            tracing::info!(attempt, max_attempts = self.max_attempts, "Generating recipe");

            match self.attempt(request, on_status).await {
                Ok(recipe) => return Ok(recipe),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt == self.max_attempts => {
                    tracing::error!(attempt, error = %e, "Recipe generation failed");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Recipe generation attempt failed");
                }
            }
        }

        Err(GenerateError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    async fn attempt(
        &self,
        request: &str,
        on_status: &(dyn Fn(&RunStatus) + Send + Sync),
    ) -> Result<StructuredRecipe, GenerateError> {
        let prompt = render_recipe_prompt(request);

        // Submission and reply fetch share the polling deadline.
        let started = Instant::now();
        let deadline = started + self.poll.timeout;
        let timed_out = |_: Elapsed| AiError::Timeout(self.poll.timeout);

        let run = timeout_at(deadline, self.client.submit(&prompt))
            .await
            .map_err(timed_out)??;
        await_completion(self.client.as_ref(), &run, &self.poll, started, on_status).await?;

        let reply = timeout_at(deadline, self.client.fetch_latest_reply(&run.thread_id))
            .await
            .map_err(timed_out)??;
        tracing::debug!(thread_id = %run.thread_id, reply = %reply, "Raw assistant reply");

        Ok(parse_recipe(&reply)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ConfigError, FakeAssistant};
    use std::time::Duration;

    const REPLY: &str = "Title: Kraken Omelette
Servings: 1
Cooking Time: 10 minutes
Ingredients:
- Eggs: 3
Instructions:
1. Whisk and fry.
Nutritional Information (for entire recipe):
Calories: 230
Protein: 19 g
Carbs: 1 g
Fat: 15 g";

    fn ignore(_: &RunStatus) {}

    fn generator(fake: Arc<FakeAssistant>) -> RecipeGenerator {
        RecipeGenerator::new(fake, PollPolicy::default(), 3)
    }

    #[tokio::test(start_paused = true)]
    async fn test_generates_on_first_attempt() {
        let fake = Arc::new(FakeAssistant::with_reply(REPLY));
        let recipe = generator(fake.clone())
            .generate("omelette", &ignore)
            .await
            .unwrap();

        assert_eq!(recipe.title, "Kraken Omelette");
        assert_eq!(recipe.nutritional_info.protein, 19);
        assert_eq!(fake.submits(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_is_tried_three_times() {
        let fake = Arc::new(FakeAssistant::with_reply("I'm sorry, I can't help with that."));
        let err = generator(fake.clone())
            .generate("omelette", &ignore)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Parse(ParseError::Incomplete { .. })));
        assert_eq!(fake.submits(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_later_attempt() {
        let fake = Arc::new(
            FakeAssistant::new().with_replies(vec!["garbage".to_string(), REPLY.to_string()]),
        );
        let recipe = generator(fake.clone())
            .generate("omelette", &ignore)
            .await
            .unwrap();

        assert_eq!(recipe.servings, 1);
        assert_eq!(fake.submits(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_retried() {
        let fake = Arc::new(
            FakeAssistant::with_reply(REPLY).with_run_statuses(vec![RunStatus::InProgress]),
        );
        let err = generator(fake.clone())
            .generate("omelette", &ignore)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Ai(AiError::Timeout(_))));
        assert_eq!(fake.submits(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_submit_times_out_within_budget() {
        let fake = Arc::new(
            FakeAssistant::with_reply(REPLY).with_submit_delay(Duration::from_secs(600)),
        );
        let policy = PollPolicy::default();

        let started = Instant::now();
        let err = RecipeGenerator::new(fake.clone(), policy.clone(), 1)
            .generate("omelette", &ignore)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Ai(AiError::Timeout(_))));
        assert!(started.elapsed() < policy.timeout + Duration::from_millis(10));
        assert_eq!(fake.status_polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_reply_fetch_times_out_within_budget() {
        let fake = Arc::new(
            FakeAssistant::with_reply(REPLY).with_fetch_delay(Duration::from_secs(600)),
        );
        let policy = PollPolicy::default();

        let started = Instant::now();
        let err = RecipeGenerator::new(fake.clone(), policy.clone(), 1)
            .generate("omelette", &ignore)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Ai(AiError::Timeout(_))));
        let elapsed = started.elapsed();
        assert!(elapsed >= policy.timeout);
        assert!(elapsed < policy.timeout + Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_error_not_retried() {
        let fake = Arc::new(FakeAssistant::new().with_submit_error(AiError::Config(
            ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()),
        )));
        let err = generator(fake.clone())
            .generate("omelette", &ignore)
            .await
            .unwrap_err();

        assert!(err.is_config());
        assert_eq!(fake.submits(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_is_exhausted() {
        let fake = Arc::new(FakeAssistant::with_reply(REPLY));
        let err = RecipeGenerator::new(fake.clone(), PollPolicy::default(), 0)
            .generate("omelette", &ignore)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Exhausted { attempts: 0 }));
        assert_eq!(fake.submits(), 0);
    }
}
