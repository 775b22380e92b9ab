use maud::{DOCTYPE, Markup, html};

use super::{TemplateData, human_date};
use crate::application::forms::Form;

fn layout(title: &str, data: &TemplateData, main: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " - Snippetbox" }
                link rel="stylesheet" href="/static/css/main.css";
            }
            body {
                header {
                    h1 { a href="/" { "Snippetbox" } }
                }
                nav {
                    div {
                        a href="/" { "Home" }
                        a href="/about" { "About" }
                        @if data.authenticated_user.is_some() {
                            a href="/snippet/create" { "Create snippet" }
                        }
                    }
                    div {
                        @if let Some(user) = &data.authenticated_user {
                            a href="/user/password" { "Change password" }
                            form action="/user/logout" method="POST" {
                                (csrf_field(data))
                                button { "Logout (" (user.name) ")" }
                            }
                        } @else {
                            a href="/user/signup" { "Signup" }
                            a href="/user/login" { "Login" }
                        }
                    }
                }
                main {
                    @if let Some(flash) = &data.flash {
                        div.flash { (flash) }
                    }
                    (main)
                }
                footer { "Powered by Rust in " (data.current_year) }
            }
        }
    }
}

fn csrf_field(data: &TemplateData) -> Markup {
    html! {
        input type="hidden" name="csrf_token" value=(data.csrf_token);
    }
}

fn field_error(form: &Form, field: &str) -> Markup {
    html! {
        @if let Some(message) = form.errors.get(field) {
            label.error { (message) }
        }
    }
}

fn form_or_default(data: &TemplateData) -> Form {
    data.form.clone().unwrap_or_default()
}

pub(super) fn home(data: &TemplateData) -> Markup {
    let main = html! {
        h2 { "Latest Snippets" }
        @if data.snippets.is_empty() {
            p { "There's nothing to see here... yet!" }
        } @else {
            table {
                tr {
                    th { "Title" }
                    th { "Created" }
                    th { "ID" }
                }
                @for snippet in &data.snippets {
                    tr {
                        td { a href={ "/snippet/" (snippet.id) } { (snippet.title) } }
                        td { (human_date(&snippet.created)) }
                        td { "#" (snippet.id) }
                    }
                }
            }
        }
    };
    layout("Home", data, &main)
}

pub(super) fn show(data: &TemplateData) -> Markup {
    let main = html! {
        @if let Some(snippet) = &data.snippet {
            div.snippet {
                div.metadata {
                    strong { (snippet.title) }
                    span { "#" (snippet.id) }
                }
                pre { code { (snippet.content) } }
                div.metadata {
                    time { "Created: " (human_date(&snippet.created)) }
                    time { "Expires: " (human_date(&snippet.expires)) }
                }
            }
        }
    };
    let title = data.snippet.as_ref().map_or_else(|| "Snippet".to_string(), |s| format!("Snippet #{}", s.id));
    layout(&title, data, &main)
}

pub(super) fn create(data: &TemplateData) -> Markup {
    let form = form_or_default(data);
    let expires = match form.get("expires") {
        "" => "365",
        other => other,
    };
    let main = html! {
        form action="/snippet/create" method="POST" {
            (csrf_field(data))
            div {
                label { "Title:" }
                (field_error(&form, "title"))
                input type="text" name="title" value=(form.get("title"));
            }
            div {
                label { "Content:" }
                (field_error(&form, "content"))
                textarea name="content" { (form.get("content")) }
            }
            div {
                label { "Delete in:" }
                (field_error(&form, "expires"))
                input type="radio" name="expires" value="365" checked[expires == "365"]; " One Year "
                input type="radio" name="expires" value="7" checked[expires == "7"]; " One Week "
                input type="radio" name="expires" value="1" checked[expires == "1"]; " One Day"
            }
            div {
                input type="submit" value="Publish snippet";
            }
        }
    };
    layout("Create a New Snippet", data, &main)
}

pub(super) fn signup(data: &TemplateData) -> Markup {
    let form = form_or_default(data);
    let main = html! {
        form action="/user/signup" method="POST" novalidate {
            (csrf_field(data))
            div {
                label { "Name:" }
                (field_error(&form, "name"))
                input type="text" name="name" value=(form.get("name"));
            }
            div {
                label { "Email:" }
                (field_error(&form, "email"))
                input type="email" name="email" value=(form.get("email"));
            }
            div {
                label { "Password:" }
                (field_error(&form, "password"))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Signup";
            }
        }
    };
    layout("Signup", data, &main)
}

pub(super) fn login(data: &TemplateData) -> Markup {
    let form = form_or_default(data);
    let main = html! {
        form action="/user/login" method="POST" novalidate {
            (csrf_field(data))
            @if let Some(message) = form.errors.get("generic") {
                div.error { (message) }
            }
            div {
                label { "Email:" }
                input type="email" name="email" value=(form.get("email"));
            }
            div {
                label { "Password:" }
                input type="password" name="password";
            }
            div {
                input type="submit" value="Login";
            }
        }
    };
    layout("Login", data, &main)
}

pub(super) fn password(data: &TemplateData) -> Markup {
    let form = form_or_default(data);
    let main = html! {
        h2 { "Change Password" }
        form action="/user/password" method="POST" novalidate {
            (csrf_field(data))
            div {
                label { "Current password:" }
                (field_error(&form, "current_password"))
                input type="password" name="current_password";
            }
            div {
                label { "New password:" }
                (field_error(&form, "new_password"))
                input type="password" name="new_password";
            }
            div {
                label { "Confirm new password:" }
                (field_error(&form, "new_password_confirmation"))
                input type="password" name="new_password_confirmation";
            }
            div {
                input type="submit" value="Change password";
            }
        }
    };
    layout("Change Password", data, &main)
}

pub(super) fn about(data: &TemplateData) -> Markup {
    let main = html! {
        h2 { "About" }
        p {
            "Snippetbox is a place to paste and share short pieces of text. "
            "Snippets expire automatically after a day, a week or a year."
        }
    };
    layout("About", data, &main)
}
