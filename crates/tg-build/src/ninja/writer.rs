//! Minimal ninja syntax writer
use std::fmt::Write as _;

/// Escape a path for use in a build statement
pub fn escape_path(path: &str) -> String {
    path.replace("$ ", "$$ ").replace(' ', "$ ").replace(':', "$:")
}

/// Rule declaration
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub name: String,
    pub command: String,
    pub description: Option<String>,
    pub depfile: Option<String>,
    pub deps: Option<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Read header dependencies from a gcc-style depfile
    pub fn with_gcc_depfile(mut self, depfile: impl Into<String>) -> Self {
        self.depfile = Some(depfile.into());
        self.deps = Some("gcc".to_string());
        self
    }
}

/// Build statement
#[derive(Debug, Clone, Default)]
pub struct Build {
    pub outputs: Vec<String>,
    pub rule: String,
    pub inputs: Vec<String>,
    pub implicit: Vec<String>,
    pub order_only: Vec<String>,
    pub variables: Vec<(String, String)>,
}

impl Build {
    pub fn new(output: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            outputs: vec![output.into()],
            rule: rule.into(),
            ..Default::default()
        }
    }

    pub fn inputs<S: Into<String>>(mut self, inputs: impl IntoIterator<Item = S>) -> Self {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    pub fn implicit<S: Into<String>>(mut self, implicit: impl IntoIterator<Item = S>) -> Self {
        self.implicit.extend(implicit.into_iter().map(Into::into));
        self
    }

    pub fn order_only<S: Into<String>>(mut self, order_only: impl IntoIterator<Item = S>) -> Self {
        self.order_only.extend(order_only.into_iter().map(Into::into));
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((key.into(), value.into()));
        self
    }
}

/// Accumulates a ninja file in memory
#[derive(Debug, Default)]
pub struct NinjaWriter {
    out: String,
}

impl NinjaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    pub fn comment(&mut self, text: &str) {
        for line in text.lines() {
            let _ = writeln!(self.out, "# {line}");
        }
    }

    pub fn variable(&mut self, key: &str, value: &str) {
        self.indented_variable(0, key, value);
    }

    fn indented_variable(&mut self, indent: usize, key: &str, value: &str) {
        let _ = writeln!(self.out, "{:indent$}{key} = {value}", "", indent = indent * 2);
    }

    pub fn rule(&mut self, rule: &Rule) {
        let _ = writeln!(self.out, "rule {}", rule.name);
        self.indented_variable(1, "command", &rule.command);
        if let Some(description) = &rule.description {
            self.indented_variable(1, "description", description);
        }
        if let Some(depfile) = &rule.depfile {
            self.indented_variable(1, "depfile", depfile);
        }
        if let Some(deps) = &rule.deps {
            self.indented_variable(1, "deps", deps);
        }
    }

    pub fn build(&mut self, build: &Build) {
        let mut line = String::from("build");
        for output in &build.outputs {
            line.push(' ');
            line.push_str(&escape_path(output));
        }
        line.push_str(": ");
        line.push_str(&build.rule);
        for input in &build.inputs {
            line.push(' ');
            line.push_str(&escape_path(input));
        }
        if !build.implicit.is_empty() {
            line.push_str(" |");
            for input in &build.implicit {
                line.push(' ');
                line.push_str(&escape_path(input));
            }
        }
        if !build.order_only.is_empty() {
            line.push_str(" ||");
            for input in &build.order_only {
                line.push(' ');
                line.push_str(&escape_path(input));
            }
        }
        let _ = writeln!(self.out, "{line}");
        for (key, value) in &build.variables {
            self.indented_variable(1, key, value);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}
