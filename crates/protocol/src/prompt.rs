//! Prompt rendering — the encode half of the protocol.
//!
//! `system_instructions` teaches the oracle the two output forms and the
//! registered tools. `render_prompt` assembles the full per-turn prompt:
//! instructions, task, and the transcript of prior steps with their
//! observations fed back as `Result:` lines so the oracle can build on
//! them (or self-correct after a tool error).

use stepline_core::{History, Intent, Task, ToolSummary};

/// Render the system instructions for a set of registered tools.
pub fn system_instructions(tools: &[ToolSummary]) -> String {
    let mut out = String::from(
        "You are a reasoning agent solving a task in iterations. \
         Respond with EXACTLY ONE of these formats per turn:\n\
         1. FUNCTION_CALL: tool_name|arg1|arg2\n\
         2. FINAL_ANSWER: [answer]\n\n\
         Available tools:\n",
    );

    for (i, tool) in tools.iter().enumerate() {
        let params = if tool.params.is_empty() {
            String::from("no arguments")
        } else {
            tool.params.join("|")
        };
        out.push_str(&format!(
            "{}. {}({}) — {}\n",
            i + 1,
            tool.name,
            params,
            tool.description
        ));
    }

    out.push_str(
        "\nRules:\n\
         - One action per turn. Wait for the result before the next step.\n\
         - Arguments are separated by pipes, in the declared order.\n\
         - Never predict a tool's result; use the Result lines you are given.\n\
         - When the task is complete, output only the FINAL_ANSWER line.\n",
    );

    out
}

/// Render the full prompt for the next oracle turn.
pub fn render_prompt(instructions: &str, task: &Task, history: &History) -> String {
    let mut out = String::with_capacity(instructions.len() + 256);
    out.push_str(instructions);
    out.push_str("\n\nTask: ");
    out.push_str(task.goal());
    out.push('\n');

    for step in history.steps() {
        out.push('\n');
        match &step.intent {
            Intent::Invoke(invocation) => {
                out.push_str(&format!(
                    "{} {}\n",
                    crate::parse::INVOKE_PREFIX,
                    invocation.call_key()
                ));
                if let Some(obs) = &step.observation {
                    out.push_str(&format!("Result: {obs}\n"));
                }
            }
            Intent::Final { payload } => {
                out.push_str(&format!("{} [{}]\n", crate::parse::FINAL_PREFIX, payload));
            }
            Intent::Unparseable => {
                // Kept for transcript completeness; a strict runner will
                // already have terminated before asking for another turn.
                out.push_str(&step.raw_text);
                out.push('\n');
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepline_core::{Invocation, Observation};

    fn summaries() -> Vec<ToolSummary> {
        vec![
            ToolSummary {
                name: "evaluate_expression".into(),
                description: "Compute a mathematical expression".into(),
                params: vec!["expression".into()],
            },
            ToolSummary {
                name: "get_price".into(),
                description: "Fetch the current price for a stock symbol".into(),
                params: vec!["symbol".into()],
            },
        ]
    }

    #[test]
    fn instructions_list_tools_and_forms() {
        let text = system_instructions(&summaries());
        assert!(text.contains("FUNCTION_CALL: tool_name|arg1|arg2"));
        assert!(text.contains("FINAL_ANSWER: [answer]"));
        assert!(text.contains("1. evaluate_expression(expression)"));
        assert!(text.contains("2. get_price(symbol)"));
    }

    #[test]
    fn prompt_carries_task_and_feedback() {
        let task = Task::new("Get the stock price of GOOG");
        let mut history = History::new();
        history.record(
            "FUNCTION_CALL: get_price|GOOG",
            Intent::Invoke(Invocation::new("get_price", vec!["GOOG".into()])),
            Some(Observation::Number(123.45)),
        );

        let prompt = render_prompt("instructions here", &task, &history);
        assert!(prompt.starts_with("instructions here"));
        assert!(prompt.contains("Task: Get the stock price of GOOG"));
        assert!(prompt.contains("FUNCTION_CALL: get_price|GOOG"));
        assert!(prompt.contains("Result: 123.45"));
    }

    #[test]
    fn error_observations_are_fed_back() {
        let task = Task::new("divide things");
        let mut history = History::new();
        history.record(
            "FUNCTION_CALL: evaluate_expression|1/0",
            Intent::Invoke(Invocation::new(
                "evaluate_expression",
                vec!["1/0".into()],
            )),
            Some(Observation::Text(
                "Error: Tool execution failed: evaluate_expression — division by zero".into(),
            )),
        );

        let prompt = render_prompt("sys", &task, &history);
        assert!(prompt.contains("Result: Error:"));
        assert!(prompt.contains("division by zero"));
    }
}
