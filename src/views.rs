//! Minimal server-rendered HTML. Every interpolated value goes through
//! [`escape`].

use axum::http::StatusCode;
use axum::response::Html;

use crate::db::{Item, User};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    ))
}

fn flash_block(flash: Option<&str>) -> String {
    flash
        .map(|message| format!("<p class=\"flash\">{}</p>", escape(message)))
        .unwrap_or_default()
}

pub fn landing(user: Option<&User>) -> Html<String> {
    let body = match user {
        Some(user) => format!(
            "<h1>To-Do List</h1>\n<p>Signed in as {}.</p>\n<a href=\"/dashboard\">Go to your list</a>",
            escape(&user.username)
        ),
        None => "<h1>To-Do List</h1>\n<a href=\"/login\">Log in</a> or <a href=\"/register\">register</a>"
            .to_string(),
    };
    layout("To-Do List", &body)
}

fn credentials_form(action: &str, submit: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\n\
         <label>Username <input type=\"text\" name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">{submit}</button>\n</form>"
    )
}

pub fn login(flash: Option<&str>, google_enabled: bool) -> Html<String> {
    let google = if google_enabled {
        "<a href=\"/auth/google\">Sign in with Google</a>"
    } else {
        ""
    };
    let body = format!(
        "<h1>Log in</h1>\n{}\n{}\n{}\n<p><a href=\"/register\">Create an account</a></p>",
        flash_block(flash),
        credentials_form("/login", "Log in"),
        google
    );
    layout("Log in", &body)
}

pub fn register(flash: Option<&str>) -> Html<String> {
    let body = format!(
        "<h1>Register</h1>\n{}\n{}\n<p><a href=\"/login\">Already registered? Log in</a></p>",
        flash_block(flash),
        credentials_form("/register", "Register")
    );
    layout("Register", &body)
}

pub fn dashboard(user: &User, items: &[Item], flash: Option<&str>) -> Html<String> {
    let rows: String = items
        .iter()
        .map(|item| {
            format!(
                "<li>\n<form method=\"post\" action=\"/edit\">\n\
                 <input type=\"hidden\" name=\"updatedItemId\" value=\"{id}\">\n\
                 <input type=\"text\" name=\"updatedItemTitle\" value=\"{title}\">\n\
                 <button type=\"submit\">Save</button>\n</form>\n\
                 <form method=\"post\" action=\"/delete\">\n\
                 <input type=\"hidden\" name=\"deleteItemId\" value=\"{id}\">\n\
                 <button type=\"submit\">Delete</button>\n</form>\n</li>\n",
                id = item.id,
                title = escape(&item.title)
            )
        })
        .collect();

    let avatar = user
        .picture
        .as_deref()
        .map(|url| format!("<img src=\"{}\" alt=\"\" width=\"32\" height=\"32\">", escape(url)))
        .unwrap_or_default();

    let body = format!(
        "<header>{avatar}<span>{name}</span>\n\
         <form method=\"post\" action=\"/logout\"><button type=\"submit\">Log out</button></form>\n\
         </header>\n<h1>Today</h1>\n{flash}\n<ul class=\"items\">\n{rows}</ul>\n\
         <form method=\"post\" action=\"/add\">\n\
         <input type=\"text\" name=\"newItem\" placeholder=\"New item\" required>\n\
         <button type=\"submit\">+</button>\n</form>",
        avatar = avatar,
        name = escape(&user.username),
        flash = flash_block(flash),
        rows = rows
    );
    layout("Today", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to start</a></p>",
        escape(title),
        escape(message)
    );
    layout(title, &body)
}
