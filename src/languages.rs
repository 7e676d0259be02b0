//! Language adapters for compilation and execution
//!
//! Every supported language is a variant of the closed `Language` enum and
//! maps to exactly one adapter. Adding a language means adding an adapter
//! and a match arm in `Language::adapter`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::core::limits::DefaultLimits;

/// Command line to execute inside the work directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub argv: Vec<String>,
}

impl CommandPlan {
    fn new(argv: &[&str]) -> Self {
        Self {
            argv: argv.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Capabilities every language provides
pub trait LanguageAdapter: Send + Sync {
    /// Name of the source file inside the work directory
    fn source_file(&self) -> &'static str;

    /// Materialize the submission into the work directory
    fn write_source(&self, work_dir: &Path, source: &str) -> std::io::Result<()> {
        std::fs::write(work_dir.join(self.source_file()), source)
    }

    /// Compile step, `None` for languages that run straight from source
    fn compile_plan(&self) -> Option<CommandPlan>;

    fn run_plan(&self) -> CommandPlan;

    fn default_limits(&self) -> DefaultLimits;

    /// Extra address space on top of the configured margin, in MB
    fn address_space_bonus_mb(&self) -> u64 {
        0
    }
}

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    Cpp,
}

impl Language {
    #[cfg(test)]
    pub const ALL: [Language; 3] = [Language::Java, Language::Python, Language::Cpp];

    pub fn adapter(self) -> &'static dyn LanguageAdapter {
        match self {
            Language::Java => &JavaAdapter,
            Language::Python => &PythonAdapter,
            Language::Cpp => &CppAdapter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::Cpp => "cpp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct JavaAdapter;

impl LanguageAdapter for JavaAdapter {
    fn source_file(&self) -> &'static str {
        "Main.java"
    }

    fn compile_plan(&self) -> Option<CommandPlan> {
        Some(CommandPlan::new(&[
            "/usr/bin/javac",
            "-J-Xms64m",
            "-J-Xmx512m",
            "-J-XX:+UseSerialGC",
            "-J-XX:CompressedClassSpaceSize=64m",
            "-J-XX:ReservedCodeCacheSize=64m",
            "-encoding",
            "UTF-8",
            "Main.java",
        ]))
    }

    fn run_plan(&self) -> CommandPlan {
        // Class space and code cache are capped so the JVM's virtual
        // reservations fit under the address-space rlimit; every thread
        // reserves -Xss
        CommandPlan::new(&[
            "/usr/bin/java",
            "-Xms32m",
            "-Xmx256m",
            "-Xss8m",
            "-XX:+UseSerialGC",
            "-XX:CompressedClassSpaceSize=64m",
            "-XX:ReservedCodeCacheSize=64m",
            "-Dfile.encoding=UTF-8",
            "-Duser.language=en",
            "-Duser.country=US",
            "-cp",
            ".",
            "Main",
        ])
    }

    fn default_limits(&self) -> DefaultLimits {
        DefaultLimits {
            time_limit_ms: 2000,
            memory_limit_mb: 256,
            output_limit_kb: 64,
        }
    }

    /// The JVM maps its heap, class space, code cache, thread stacks and
    /// malloc arenas up front, far beyond a small memory limit
    fn address_space_bonus_mb(&self) -> u64 {
        1024
    }
}

pub struct PythonAdapter;

impl LanguageAdapter for PythonAdapter {
    fn source_file(&self) -> &'static str {
        "main.py"
    }

    /// Syntax check only
    fn compile_plan(&self) -> Option<CommandPlan> {
        Some(CommandPlan::new(&[
            "/usr/bin/python3",
            "-B",
            "-m",
            "py_compile",
            "main.py",
        ]))
    }

    fn run_plan(&self) -> CommandPlan {
        CommandPlan::new(&["/usr/bin/python3", "-u", "main.py"])
    }

    fn default_limits(&self) -> DefaultLimits {
        DefaultLimits {
            time_limit_ms: 3000,
            memory_limit_mb: 256,
            output_limit_kb: 64,
        }
    }
}

pub struct CppAdapter;

impl LanguageAdapter for CppAdapter {
    fn source_file(&self) -> &'static str {
        "main.cpp"
    }

    fn compile_plan(&self) -> Option<CommandPlan> {
        Some(CommandPlan::new(&[
            "/usr/bin/g++",
            "-O2",
            "-std=gnu++17",
            "-pipe",
            "-o",
            "app",
            "main.cpp",
        ]))
    }

    fn run_plan(&self) -> CommandPlan {
        CommandPlan::new(&["./app"])
    }

    fn default_limits(&self) -> DefaultLimits {
        DefaultLimits {
            time_limit_ms: 1000,
            memory_limit_mb: 256,
            output_limit_kb: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names_round_trip() {
        for language in Language::ALL {
            let json = serde_json::to_string(&language).unwrap();
            assert_eq!(json, format!("\"{}\"", language));
            let parsed: Language = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, language);
        }
        assert!(serde_json::from_str::<Language>("\"rust\"").is_err());
        assert!(serde_json::from_str::<Language>("\"Python\"").is_err());
    }

    #[test]
    fn test_source_files() {
        assert_eq!(Language::Java.adapter().source_file(), "Main.java");
        assert_eq!(Language::Python.adapter().source_file(), "main.py");
        assert_eq!(Language::Cpp.adapter().source_file(), "main.cpp");
    }

    #[test]
    fn test_compile_plans_reference_source_file() {
        for language in Language::ALL {
            let adapter = language.adapter();
            let plan = adapter.compile_plan().expect("all languages have a compile step");
            assert!(plan.argv.iter().any(|a| a == adapter.source_file()));
        }
    }

    #[test]
    fn test_java_plans() {
        let adapter = Language::Java.adapter();
        let compile = adapter.compile_plan().unwrap();
        assert!(compile.argv.contains(&"UTF-8".to_string()));
        assert!(compile.argv.iter().any(|a| a.starts_with("-J-Xmx")));

        let run = adapter.run_plan();
        assert_eq!(run.argv.last().map(String::as_str), Some("Main"));
        assert!(run.argv.contains(&"-XX:+UseSerialGC".to_string()));
        assert!(run.argv.windows(2).any(|w| w[0] == "-cp" && w[1] == "."));
    }

    #[test]
    fn test_java_thread_stacks_fit_address_space() {
        let adapter = Language::Java.adapter();
        let xss = adapter
            .run_plan()
            .argv
            .iter()
            .find_map(|a| a.strip_prefix("-Xss").map(str::to_string))
            .unwrap();
        assert_eq!(xss, "8m");
        assert!(adapter.address_space_bonus_mb() >= 512);
    }

    #[test]
    fn test_native_languages_have_no_bonus() {
        assert_eq!(Language::Python.adapter().address_space_bonus_mb(), 0);
        assert_eq!(Language::Cpp.adapter().address_space_bonus_mb(), 0);
    }

    #[test]
    fn test_python_plans() {
        let adapter = Language::Python.adapter();
        assert!(adapter.compile_plan().unwrap().argv.contains(&"-B".to_string()));
        assert_eq!(
            adapter.run_plan().argv,
            vec!["/usr/bin/python3", "-u", "main.py"]
        );
    }

    #[test]
    fn test_cpp_plans() {
        let adapter = Language::Cpp.adapter();
        let compile = adapter.compile_plan().unwrap();
        assert!(compile.argv.contains(&"-std=gnu++17".to_string()));
        assert!(compile.argv.windows(2).any(|w| w[0] == "-o" && w[1] == "app"));
        assert_eq!(adapter.run_plan().argv, vec!["./app"]);
    }

    #[test]
    fn test_write_source() {
        let dir = tempfile::tempdir().unwrap();
        Language::Cpp
            .adapter()
            .write_source(dir.path(), "int main() {}")
            .unwrap();
        let written = std::fs::read_to_string(dir.path().join("main.cpp")).unwrap();
        assert_eq!(written, "int main() {}");
    }
}
