//! Navigation guard. Routing is a static rule table consulted with the
//! session presence known at the moment of navigation; the guard has no side
//! effects and is UX only, the API still rejects missing or stale tokens.

pub const ROOT: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const DASHBOARD: &str = "/dashboard";
pub const LOGOUT: &str = "/logout";

/// Upper bound on redirects followed by [`resolve`].
const MAX_REDIRECTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Allow,
    RedirectTo(&'static str),
}

/// Routes the shell knows how to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
    Logout,
}

impl Route {
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match normalize(path) {
            ROOT => Some(Self::Root),
            LOGIN => Some(Self::Login),
            REGISTER => Some(Self::Register),
            DASHBOARD => Some(Self::Dashboard),
            LOGOUT => Some(Self::Logout),
            _ => None,
        }
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Root => ROOT,
            Self::Login => LOGIN,
            Self::Register => REGISTER,
            Self::Dashboard => DASHBOARD,
            Self::Logout => LOGOUT,
        }
    }
}

struct Rule {
    path: &'static str,
    with_session: Outcome,
    without_session: Outcome,
}

const RULES: &[Rule] = &[
    Rule {
        path: ROOT,
        with_session: Outcome::RedirectTo(DASHBOARD),
        without_session: Outcome::RedirectTo(LOGIN),
    },
    Rule {
        path: LOGIN,
        with_session: Outcome::RedirectTo(DASHBOARD),
        without_session: Outcome::Allow,
    },
    Rule {
        path: REGISTER,
        with_session: Outcome::RedirectTo(DASHBOARD),
        without_session: Outcome::Allow,
    },
    Rule {
        path: DASHBOARD,
        with_session: Outcome::Allow,
        without_session: Outcome::RedirectTo(LOGIN),
    },
    // logout always runs, whatever the session state
    Rule {
        path: LOGOUT,
        with_session: Outcome::Allow,
        without_session: Outcome::Allow,
    },
];

/// Unknown paths fall back to the root.
const FALLBACK: Outcome = Outcome::RedirectTo(ROOT);

/// Strips query and fragment and drops a trailing `/` (except for the root).
#[must_use]
pub fn normalize(path: &str) -> &str {
    let path = path.trim();
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        ROOT
    } else {
        trimmed
    }
}

#[must_use]
pub fn decide(path: &str, session_present: bool) -> Outcome {
    let path = normalize(path);
    RULES
        .iter()
        .find(|rule| rule.path == path)
        .map_or(FALLBACK, |rule| {
            if session_present {
                rule.with_session
            } else {
                rule.without_session
            }
        })
}

/// Follows redirects from `path` to the route that is finally allowed.
#[must_use]
pub fn resolve(path: &str, session_present: bool) -> Route {
    let mut current = normalize(path);
    for _ in 0..MAX_REDIRECTS {
        match decide(current, session_present) {
            Outcome::RedirectTo(next) => current = next,
            Outcome::Allow => {
                if let Some(route) = Route::from_path(current) {
                    return route;
                }
                break;
            }
        }
    }
    if session_present {
        Route::Dashboard
    } else {
        Route::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_table() {
        let cases = [
            ("/", true, Outcome::RedirectTo("/dashboard")),
            ("/", false, Outcome::RedirectTo("/login")),
            ("/login", true, Outcome::RedirectTo("/dashboard")),
            ("/login", false, Outcome::Allow),
            ("/register", true, Outcome::RedirectTo("/dashboard")),
            ("/register", false, Outcome::Allow),
            ("/dashboard", true, Outcome::Allow),
            ("/dashboard", false, Outcome::RedirectTo("/login")),
            ("/logout", true, Outcome::Allow),
            ("/logout", false, Outcome::Allow),
            ("/settings", true, Outcome::RedirectTo("/")),
            ("/settings", false, Outcome::RedirectTo("/")),
            ("", false, Outcome::RedirectTo("/login")),
        ];

        for (path, present, expected) in cases {
            assert_eq!(decide(path, present), expected, "{path} present={present}");
        }
    }

    #[test]
    fn decide_is_stable() {
        for _ in 0..3 {
            assert_eq!(decide("/dashboard", false), Outcome::RedirectTo("/login"));
            assert_eq!(decide("/logout", true), Outcome::Allow);
        }
    }

    #[test]
    fn normalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(normalize("/login/"), "/login");
        assert_eq!(normalize("/dashboard?tab=notes"), "/dashboard");
        assert_eq!(normalize("/dashboard#top"), "/dashboard");
        assert_eq!(normalize("///"), "/");
        assert_eq!(normalize(" /logout "), "/logout");
    }

    #[test]
    fn resolve_follows_redirects() {
        assert_eq!(resolve("/", false), Route::Login);
        assert_eq!(resolve("/", true), Route::Dashboard);
        assert_eq!(resolve("/nowhere", false), Route::Login);
        assert_eq!(resolve("/nowhere", true), Route::Dashboard);
        assert_eq!(resolve("/login", true), Route::Dashboard);
        assert_eq!(resolve("/logout", false), Route::Logout);
        assert_eq!(resolve("/register/", false), Route::Register);
    }

    #[test]
    fn every_route_has_a_rule() {
        for route in [
            Route::Root,
            Route::Login,
            Route::Register,
            Route::Dashboard,
            Route::Logout,
        ] {
            assert!(RULES.iter().any(|rule| rule.path == route.path()));
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }
}
