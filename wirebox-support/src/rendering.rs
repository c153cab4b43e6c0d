//! Text rendering for container diagnostics.
//!
//! Type names coming out of [`std::any::type_name`] are fully qualified and
//! noisy. These helpers turn them into something a person can scan in an
//! error message.

/// Strips module paths from a type name, keeping generics intact.
///
/// ```
/// use wirebox_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("demo::store::InMemoryKeyValueStore"), "InMemoryKeyValueStore");
/// assert_eq!(shorten_type_name("dyn demo::log::Logger"), "dyn Logger");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn demo::log::Logger>"),
///     "Arc<dyn Logger>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut segment = String::new();
    let mut chars = full_name.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '&' | '[' | ']' | ';' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Joins a resolution chain into `A → B → A`, shortening every name.
///
/// ```
/// use wirebox_support::rendering::render_chain;
///
/// let chain = ["app::Mailer", "app::Templates", "app::Mailer"];
/// assert_eq!(render_chain(&chain), "Mailer → Templates → Mailer");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|name| shorten_type_name(name.as_ref()))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Picks registered names that look like what the caller asked for.
///
/// Scoring favours substring matches on the full name, then on the short
/// name, then a shared prefix of at least three characters. At most
/// `max_suggestions` names are returned, best first.
pub fn suggest_similar<'a>(
    requested: &str,
    available: impl IntoIterator<Item = &'a str>,
    max_suggestions: usize,
) -> Vec<&'a str> {
    let requested_full = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&'a str, usize)> = available
        .into_iter()
        .filter(|name| *name != requested)
        .filter_map(|name| {
            let full = name.to_lowercase();
            let short = shorten_type_name(name).to_lowercase();

            if full.contains(&requested_full) || requested_full.contains(&full) {
                return Some((name, 100));
            }
            if short.contains(&requested_short) || requested_short.contains(&short) {
                return Some((name, 80));
            }

            let common = short
                .trim_start_matches("dyn ")
                .chars()
                .zip(requested_short.trim_start_matches("dyn ").chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name)
        .collect()
}
