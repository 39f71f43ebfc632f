//! Prompt and response schema sent to the generative backend.

use serde_json::{Value, json};

use crate::request::{RepoRequest, TemplateChoice};

/// Placeholder the backend is asked to use for the account name.
pub const USERNAME_PLACEHOLDER: &str = "<YOUR-USERNAME>";

fn describe_gitignore(choice: &TemplateChoice) -> String {
    match choice {
        TemplateChoice::None => "no .gitignore template".to_string(),
        TemplateChoice::Named(name) => format!("the {} .gitignore template", name),
    }
}

fn describe_license(choice: &TemplateChoice) -> String {
    match choice {
        TemplateChoice::None => "no license".to_string(),
        TemplateChoice::Named(name) => format!("the {} license", name),
    }
}

/// Build the instruction text for a repository request.
///
/// Every field is rendered, including "none" selections, so the backend does not
/// invent a license or template the user did not pick.
pub fn build_prompt(request: &RepoRequest) -> String {
    let description = if request.description.trim().is_empty() {
        "(no description provided)".to_string()
    } else {
        request.description.clone()
    };
    let readme = if request.include_readme { "yes" } else { "no" };
    let license_section = match &request.license_template {
        TemplateChoice::None => {
            "Do not add a License section and do not mention any license.".to_string()
        }
        TemplateChoice::Named(name) => {
            format!("Finish with a License section that names the {} license.", name)
        }
    };

    format!(
        "You help developers publish new projects on GitHub.\n\
         Set up a repository with these details:\n\
         - Name: {name}\n\
         - Description: {description}\n\
         - Visibility: {visibility}\n\
         - Start with a README: {readme}\n\
         - .gitignore: {gitignore}\n\
         - License: {license}\n\
         \n\
         Reply with a JSON object holding exactly two fields.\n\
         1. \"steps\": an ordered array of objects, each with a \"command\" (one shell command) \
         and an \"explanation\" (one short sentence). Cover creating the local repository with \
         git init, staging the files, making the initial commit, creating the {visibility} \
         remote on GitHub and pushing to it. Write the account name as {placeholder}.\n\
         2. \"readmeMarkdown\": a README.md in Markdown titled \"{name}\" that includes the \
         description and sections for Installation, Usage and Contributing. {license_section}\n",
        name = request.name(),
        description = description,
        visibility = request.visibility,
        readme = readme,
        gitignore = describe_gitignore(&request.gitignore_template),
        license = describe_license(&request.license_template),
        placeholder = USERNAME_PLACEHOLDER,
        license_section = license_section,
    )
}

/// Response shape requested from the backend, in the Gemini OpenAPI-subset form.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "steps": {
                "type": "ARRAY",
                "description": "Ordered git commands with a short explanation each.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "command": {
                            "type": "STRING",
                            "description": "A single shell command."
                        },
                        "explanation": {
                            "type": "STRING",
                            "description": "What the command does."
                        }
                    },
                    "required": ["command", "explanation"],
                    "propertyOrdering": ["command", "explanation"]
                }
            },
            "readmeMarkdown": {
                "type": "STRING",
                "description": "Full README.md content in Markdown."
            }
        },
        "required": ["steps", "readmeMarkdown"],
        "propertyOrdering": ["steps", "readmeMarkdown"]
    })
}
