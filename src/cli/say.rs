//! Non-interactive "say" command

use std::error::Error;

use crate::core::router::ResponseRouter;

/// Prints the reply to a single message. Failures are already folded into
/// the reply text, so this only fails on stdout errors.
pub async fn run_say(router: &ResponseRouter, prompt: &str) -> Result<(), Box<dyn Error>> {
    let reply = router.route(prompt).await;
    println!("{reply}");
    Ok(())
}
