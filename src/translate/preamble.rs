//! Runtime support block written at the top of every generated program.
//!
//! Generated statements call into these symbols without declaring them:
//! `fastio`, `_print`, `read_int`, `read_line`, `read_int_list`, `to_ll`,
//! `to_double`, plus the type aliases and constants.

pub const PREAMBLE: &[&str] = &[
    "#include <bits/stdc++.h>",
    "using namespace std;",
    "",
    "// ------------------- FAST I/O -------------------",
    "#define fastio ios::sync_with_stdio(false); cin.tie(nullptr)",
    "#define endl '\\n'",
    "",
    "// ------------------- SHORTCUTS -------------------",
    "#define all(x) (x).begin(), (x).end()",
    "#define rall(x) (x).rbegin(), (x).rend()",
    "#define pb push_back",
    "#define ff first",
    "#define ss second",
    "#define sz(x) ((int)(x).size())",
    "using ll = long long;",
    "using ld = long double;",
    "using pii = pair<int,int>;",
    "using pll = pair<ll,ll>;",
    "using vi = vector<int>;",
    "using vll = vector<ll>;",
    "",
    "// ------------------- CONSTANTS -------------------",
    "const ll INF = 1e18;",
    "const int MOD = 1e9 + 7;",
    "const ld EPS = 1e-9;",
    "const int dx[4] = {1, 0, -1, 0};",
    "const int dy[4] = {0, 1, 0, -1};",
    "",
    "// ------------------- DEBUG (comment out in CF) -------------------",
    "#ifdef LOCAL",
    "#define debug(x) cerr << #x << \" = \" << (x) << endl",
    "#else",
    "#define debug(x)",
    "#endif",
    "",
    "// ---- helpers ----",
    "template<typename T> void _print(const T& x){ cout << x; }",
    "template<typename T, typename... R> void _print(const T& x, const R&... r){ cout << x; ((cout << ' ' << r), ...); }",
    "static inline long long read_int(){ long long x; if(!(cin>>x)) return 0; return x; }",
    "static inline string read_line(){ string s; if(cin.peek()=='\\n') cin.get(); getline(cin, s); return s; }",
    "static inline vector<long long> read_int_list(){ string s = read_line(); istringstream iss(s); vector<long long> a; long long x; while(iss>>x) a.push_back(x); return a; }",
    "static inline long long to_ll(const string& s){ try{ size_t p; long long v=stoll(s,&p); return v; }catch(...){ return 0; } }",
    "static inline double to_double(const string& s){ try{ size_t p; double v=stod(s,&p); return v; }catch(...){ return 0; } }",
    "",
];

/// Symbols every generated program can rely on
pub const ABI_SYMBOLS: &[&str] = &[
    "#define fastio",
    "const ll INF",
    "const int MOD",
    "const ld EPS",
    "const int dx[4]",
    "const int dy[4]",
    "#define debug(x)",
    "void _print(const T& x)",
    "long long read_int()",
    "string read_line()",
    "vector<long long> read_int_list()",
    "long long to_ll(const string& s)",
    "double to_double(const string& s)",
];

pub fn text() -> String {
    PREAMBLE.join("\n")
}
