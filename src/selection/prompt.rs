//! Prompt construction for plugin selection

use crate::llm::ChatMessage;
use crate::plugins::Plugin;
use std::sync::Arc;

/// System instruction sent ahead of every selection prompt
pub const SYSTEM_PROMPT: &str = "You are a helpful and kind assistant to answer questions \
that can use tools to interact with the real world and get access to the latest information.";

const INSTRUCTIONS: &str = r#"You have some plugin tools to choose from. If none of them fits, reply with an empty json object '{}'.
When you call a plugin, reply in json using exactly this format:
'''
{
  "plugin": "$PluginName",
  "args": { $ArgsExample }
}
'''
Replace $PluginName with the name of the plugin and $ArgsExample with the arguments for the plugin.
Keep the keys exactly as they appear in the plugin's argument example; do not rename any json key.
Once you have chosen a tool, do not explain why you chose it. Only give the selected tool and the prepared arguments.

For example, suppose the user provides a Google plugin with this argument example:
'''
* Google: Searches the web., example args: {"query": "search terms"}
'''

When the user asks what day of the week tomorrow is, you should reply:
'''
{
  "plugin": "Google",
  "args": {
    "query": "what day of the week is tomorrow"
  }
}
'''

If no tool fits, or you are not sure which tool completes the user's goal, reply with an empty json object:
'''
{}
'''

These are the tools you can choose from. Based on the user's goal, choose one of them. Each line gives the plugin name, what it does, and a json example of its arguments:
"#;

/// Render the full selection prompt for `goal`
pub fn compile<'a, I>(goal: &str, catalog: I) -> String
where
    I: IntoIterator<Item = &'a Arc<dyn Plugin>>,
{
    format!(
        "Your goal is: {}\n\n{}\n'''\n{}\n'''\n",
        goal,
        INSTRUCTIONS,
        render_catalog(catalog)
    )
}

/// The two-message conversation handed to the LLM client
pub fn conversation<'a, I>(goal: &str, catalog: I) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = &'a Arc<dyn Plugin>>,
{
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(compile(goal, catalog)),
    ]
}

fn render_catalog<'a, I>(catalog: I) -> String
where
    I: IntoIterator<Item = &'a Arc<dyn Plugin>>,
{
    catalog
        .into_iter()
        .map(|plugin| catalog_line(plugin.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `* name: description, example args: {...}` line
fn catalog_line(plugin: &dyn Plugin) -> String {
    let example = strip_newlines(plugin.input_example()).replace('\t', "");
    format!(
        "* {}: {}, example args: {}",
        strip_newlines(plugin.name()),
        strip_newlines(plugin.description()),
        example
    )
}

fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}
