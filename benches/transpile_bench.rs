// Translation latency benchmark.
// Measures in-process transpile() time for representative scripts.
// Target: p95 < 5ms for every scenario.

use std::time::{Duration, Instant};
use transbox::translate::transpile;

const ITERATIONS: usize = 500;
const WARMUP_ITERATIONS: usize = 50;
const P95_BUDGET: Duration = Duration::from_millis(5);

struct LatencyStats {
    p50: Duration,
    p95: Duration,
    max: Duration,
    mean: Duration,
}

impl LatencyStats {
    fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let len = samples.len();
        let sum: Duration = samples.iter().sum();

        Self {
            p50: samples[(len as f64 * 0.50) as usize],
            p95: samples[(len as f64 * 0.95) as usize],
            max: samples[len - 1],
            mean: sum / len as u32,
        }
    }
}

struct Scenario {
    name: &'static str,
    source: String,
}

fn scenarios() -> Vec<Scenario> {
    let loops = "n = int(input())\ntotal = 0\nfor i in range(n):\n    if i % 3 == 0:\n        total += i\n    elif i % 5 == 0:\n        total -= 1\n    else:\n        total = total * 2 % 1000007\nprint(total)\n";

    let functions = "def gcd(a, b):\n    while b:\n        a, b = b, a % b\n    return a\n\ndef solve():\n    x, y = map(int, input().split())\n    print(gcd(x, y))\n\nsolve()\n";

    // 200 functions of straight-line code
    let mut large = String::new();
    for i in 0..200 {
        large.push_str(&format!(
            "def f{i}(a, b):\n    c = a * {i} + b\n    if 0 <= c < 100:\n        return c\n    return max(a, b)\n\n"
        ));
    }
    large.push_str("print(f0(1, 2))\n");

    vec![
        Scenario {
            name: "Loops and branches",
            source: loops.to_string(),
        },
        Scenario {
            name: "Functions and unpacking",
            source: functions.to_string(),
        },
        Scenario {
            name: "200 functions",
            source: large,
        },
    ]
}

fn measure(scenario: &Scenario) -> LatencyStats {
    for _ in 0..WARMUP_ITERATIONS {
        let _ = transpile(&scenario.source);
    }

    let mut samples = Vec::with_capacity(ITERATIONS);
    for _ in 0..ITERATIONS {
        let start = Instant::now();
        let _ = transpile(&scenario.source);
        samples.push(start.elapsed());
    }
    LatencyStats::from_samples(samples)
}

fn main() {
    println!("=== transbox translation benchmark ===");
    println!("Iterations: {} (after {} warmup)", ITERATIONS, WARMUP_ITERATIONS);

    let mut failed = 0;
    for scenario in scenarios() {
        let stats = measure(&scenario);
        println!("\n=== {} ({} bytes) ===", scenario.name, scenario.source.len());
        println!("  p50: {:?}", stats.p50);
        println!("  p95: {:?}", stats.p95);
        println!("  max: {:?}", stats.max);
        println!("  mean: {:?}", stats.mean);

        if stats.p95 < P95_BUDGET {
            println!("✅ PASS");
        } else {
            println!("❌ FAIL: p95={:?} (target <{:?})", stats.p95, P95_BUDGET);
            failed += 1;
        }
    }

    println!("\n=== Summary ===");
    if failed == 0 {
        println!("✅ All translation budgets met");
    } else {
        println!("❌ {} scenario(s) over budget", failed);
        std::process::exit(1);
    }
}
