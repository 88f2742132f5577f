/// Joins a base URL and an endpoint path without doubling slashes.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Shortens a response body for log lines and error messages.
pub fn truncate(s: &str) -> String {
    const MAX: usize = 512;
    if s.len() <= MAX {
        return s.to_string();
    }
    let mut end = MAX;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

pub fn mask_secret(s: &str, left: usize, right: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= left + right {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..left].iter().collect();
    let tail: String = chars[chars.len() - right..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - left - right), tail)
}

/// Masks the password and query string of a URL, leaving scheme, host and path readable.
pub fn mask_url(url: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };
    let mut out = match base.split_once("://") {
        Some((scheme, rest)) => {
            let (authority, path) = match rest.find('/') {
                Some(i) => rest.split_at(i),
                None => (rest, ""),
            };
            let authority = match authority.rsplit_once('@') {
                Some((userinfo, host)) => match userinfo.split_once(':') {
                    Some((user, password)) => format!("{}:{}@{}", user, mask_secret(password, 0, 0), host),
                    None => format!("{}@{}", userinfo, host),
                },
                None => authority.to_string(),
            };
            format!("{}://{}{}", scheme, authority, path)
        }
        None => base.to_string(),
    };
    if let Some(query) = query {
        out.push('?');
        out.push_str(&mask_secret(query, 0, 0));
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
