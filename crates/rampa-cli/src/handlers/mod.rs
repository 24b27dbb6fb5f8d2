//! Command handlers - extracted from main.rs for testability

pub mod run;
pub mod serve;
pub mod validate;

pub use run::{build_run_config, execute_run};
pub use serve::execute_serve;
pub use validate::execute_validate;

use rampa::{format_duration, RunConfig, RunPlan};

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    tracing::info!("interrupt received, draining");
}

/// One-line description of what a config will do
pub fn describe_plan(config: &RunConfig, plan: &RunPlan) -> String {
    let stages: Vec<String> = plan.iter().map(ToString::to_string).collect();
    format!(
        "{} stage(s) [{}], peak {} users ending at {} over {}, {} credentials -> {}",
        plan.len(),
        stages.join(", "),
        plan.peak_target(),
        plan.final_target(),
        format_duration(plan.total_duration()),
        config.mode,
        config.url
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_default_plan() {
        let config = RunConfig::default();
        let text = describe_plan(&config, &config.plan().unwrap());
        assert!(text.starts_with("4 stage(s) [1m:1000, 1m:2000, 1m:3000, 1m:0]"));
        assert!(text.contains("peak 3000 users ending at 0 over 4m"));
        assert!(text.contains("fixed credentials -> http://localhost:8080/login"));
    }

    #[test]
    fn test_describe_plan_that_ends_loaded() {
        let config = RunConfig::default().with_stages(vec![rampa::Stage::secs(10, 5)]);
        let text = describe_plan(&config, &config.plan().unwrap());
        assert!(text.contains("peak 5 users ending at 5 over 10s"), "{text}");
    }
}
