use crate::repair::GenerationRequest;
use regex::Regex;
use std::sync::OnceLock;

macro_rules! boilerplate {
    () => {
        r#"
#include <bits/stdc++.h>
using namespace std;

// fast io
#define fastio ios::sync_with_stdio(false); cin.tie(nullptr)
#define endl '\n'

// shorthands
#define all(x) begin(x), end(x)
#define rall(x) rbegin(x), rend(x)
#define pb push_back
#define ff first
#define ss second
#define sz(x) (int((x).size()))

using ll  = long long;
using ld  = long double;
using pii = pair<int,int>;
using pll = pair<ll,ll>;
using vi  = vector<int>;
using vll = vector<ll>;

// constants
const ll INF = (ll)1e18;
const int MOD = 1e9 + 7;
const ld EPS = 1e-9;
const int dx[4] = {1, 0, -1, 0};
const int dy[4] = {0, 1, 0, -1};

// debug (enable with -DLOCAL)
#ifdef LOCAL
  #define debug(x) cerr << #x << " = " << (x) << endl
#else
  #define debug(x) ((void)0)
#endif

void solve() {
    // write solution here
}

int main() {
    fastio;
    int t = 1;
    // cin >> t; // multiple tests
    while (t--) solve();
    return 0;
}
"#
    };
}

/// Program skeleton the generator is told to copy verbatim.
pub const BOILERPLATE: &str = boilerplate!();

/// Fixed system instruction sent with every request
pub const SYSTEM_PROMPT: &str = concat!(
    "You are an elite competitive programmer and C++ translator.
Convert the user's Python into ONE self-contained C++17 program that compiles with GNU g++.
HARD RULES:
- Copy the boilerplate exactly as given and write ALL logic inside solve().
- Preserve input/output behavior. Read from stdin, write to stdout. No prompts.
- Prefer long long for integers and vector<long long> for int lists where applicable.
- No extra libraries beyond <bits/stdc++.h>. No extra commentary.
Return ONLY the full C++ file in a single fenced code block.
Boilerplate:
",
    boilerplate!(),
    "\n"
);

pub fn initial_request(python_source: &str) -> GenerationRequest {
    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: format!(
            "Convert this Python to C++ (write logic inside solve()). Keep the same I/O:\n\n```python\n{}\n```",
            python_source
        ),
    }
}

/// Request carrying the raw compiler diagnostics of the last candidate.
pub fn repair_request(diagnostics: &str) -> GenerationRequest {
    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: format!(
            "The C++ failed to compile with these errors:\n\n{}\n\n\
             Fix and reprint the FULL corrected C++ file. Keep the SAME boilerplate and constraints. \
             Return ONLY the code in one fenced code block.",
            diagnostics
        ),
    }
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?is)```(?:cpp|c\+\+|cc|cxx)?\s*(.*?)```").expect("fence pattern is valid")
    })
}

/// Body of the first fenced block, trimmed; the whole text when there is none.
pub fn extract_code(text: &str) -> String {
    fence_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tagged_block() {
        let text = "Here you go:\n```cpp\nint main(){}\n```\nthanks";
        assert_eq!(extract_code(text), "int main(){}");
    }

    #[test]
    fn tag_is_case_insensitive_and_optional() {
        assert_eq!(extract_code("```C++\nx\n```"), "x");
        assert_eq!(extract_code("```\ny;\n```"), "y;");
    }

    #[test]
    fn first_block_wins() {
        assert_eq!(extract_code("```cpp\na\n```\n```cpp\nb\n```"), "a");
    }

    #[test]
    fn falls_back_to_raw_text() {
        assert_eq!(extract_code("  int main(){}  \n"), "int main(){}");
    }

    #[test]
    fn requests_carry_rules_and_payload() {
        let first = initial_request("print(1)");
        assert!(first.system.contains("HARD RULES"));
        assert!(first.system.contains("void solve()"));
        assert!(first.prompt.contains("```python\nprint(1)\n```"));

        let repair = repair_request("main.cpp:1: error: boom");
        assert_eq!(repair.system, first.system);
        assert!(repair.prompt.contains("main.cpp:1: error: boom"));
        assert!(repair.prompt.contains("FULL corrected C++ file"));
    }
}
