//! Prompt templates.
//!
//! Prompts are Jinja templates rendered with [`minijinja`] against the
//! request descriptor. Unknown variables render as empty text, so a
//! descriptor only needs the keys a template actually uses.

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::types::RequestDescriptor;
use crate::Result;

/// Render a Jinja `source` template against `context`.
///
/// Supports the usual Jinja subset: substitution, `if`, `for`, filters such
/// as `default`. Rendering is deterministic for a given input.
pub fn render<S: Serialize>(source: &str, context: &S) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Lenient);
    Ok(env.render_str(source, context)?)
}

/// A system prompt plus a user prompt template.
pub trait PromptTemplate: Send + Sync {
    /// Instruction sent to the backend ahead of the rendered prompt.
    fn system_prompt(&self) -> &str;

    /// Jinja source of the user prompt.
    fn template(&self) -> &str;

    /// Render [`template`](Self::template) against `descriptor`.
    fn render(&self, descriptor: &RequestDescriptor) -> Result<String> {
        render(self.template(), descriptor)
    }
}

const CODE_SYSTEM_PROMPT: &str = "\
You are an expert programmer. Your task is to generate high-quality, \
well-documented code based on the given requirements. Follow these guidelines:

1. Write clean, maintainable code
2. Include appropriate documentation
3. Follow the specified template structure
4. Use proper error handling
5. Follow language-specific best practices";

const CODE_TEMPLATE: &str = "\
Generate code based on the following description:

Name: {{ name }}
Description: {{ description }}
{% if template %}
Template Structure:
```
{{ template }}
```
{% endif %}
Additional Requirements:
{% for req in requirements %}
- {{ req }}
{% endfor %}
Language: {{ language|default('python') }}

Please provide the implementation with appropriate documentation and error handling.
";

/// Code generation prompt.
///
/// Uses `name`, `description`, `template` (optional skeleton),
/// `requirements` (list) and `language` (default `python`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeTemplate;

impl PromptTemplate for CodeTemplate {
    fn system_prompt(&self) -> &str {
        CODE_SYSTEM_PROMPT
    }

    fn template(&self) -> &str {
        CODE_TEMPLATE
    }
}

const TEST_SYSTEM_PROMPT: &str = "\
You are an expert in test-driven development. Your task is to generate \
comprehensive test cases for the given code. Follow these guidelines:

1. Cover edge cases
2. Include both positive and negative test cases
3. Use appropriate test frameworks
4. Write clear test descriptions
5. Follow testing best practices";

const TEST_TEMPLATE: &str = "\
Generate test cases for the following code:

```{{ language|default('python') }}
{{ code }}
```

Test Requirements:
{% for req in requirements %}
- {{ req }}
{% endfor %}
Framework: {{ framework|default('pytest') }}

Please provide comprehensive test cases with appropriate assertions and error cases.
";

/// Test generation prompt.
///
/// Expects the generated code under `code`, plus optional `requirements`,
/// `language` and `framework` (default `pytest`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TestTemplate;

impl PromptTemplate for TestTemplate {
    fn system_prompt(&self) -> &str {
        TEST_SYSTEM_PROMPT
    }

    fn template(&self) -> &str {
        TEST_TEMPLATE
    }
}
