//! HTML pages. Every value that came from a user goes through `escape`.

use crate::category::Category;
use crate::task::{Task, TaskFields};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn layout(title: &str, user: Option<&str>, flash: &[String], body: &str) -> String {
    let nav = match user {
        Some(username) => format!(
            r#"<a href="/get_tasks">Home</a>
        <a href="/profile/{user}">Profile</a>
        <a href="/add_task">New Task</a>
        <a href="/show_categories">Manage Categories</a>
        <a href="/logout">Log Out</a>"#,
            user = escape(username)
        ),
        None => r#"<a href="/get_tasks">Home</a>
        <a href="/login">Log In</a>
        <a href="/register">Register</a>"#
            .to_string(),
    };

    let messages: String = flash
        .iter()
        .map(|message| format!(r#"<p class="flash">{}</p>"#, escape(message)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | Task Manager</title>
    <script defer src="/static/js/script.js"></script>
</head>
<body>
    <header>
        <h1>Task Manager</h1>
        <nav>
        {nav}
        </nav>
    </header>
    <section class="messages">{messages}</section>
    <main>
{body}
    </main>
</body>
</html>
"#,
        title = escape(title),
        nav = nav,
        messages = messages,
        body = body
    )
}

pub fn task_list(tasks: &[Task], user: Option<&str>) -> String {
    if tasks.is_empty() {
        return "<h2>All Tasks</h2>\n<p>No tasks yet.</p>".to_string();
    }

    let items: String = tasks
        .iter()
        .map(|task| {
            let urgent = if task.is_urgent {
                r#" <strong class="urgent">Urgent!</strong>"#
            } else {
                ""
            };
            // Only the owner is offered the edit and delete links
            let actions = if user == Some(task.owner_username.as_str()) {
                format!(
                    r#"<a href="/edit_task/{id}">Edit</a> <a href="/delete_task/{id}">Done</a>"#,
                    id = escape(&task.id)
                )
            } else {
                String::new()
            };
            format!(
                r#"<li class="task">
    <h3>{name}{urgent}</h3>
    <p><em>{category}</em> due {due}</p>
    <p>{description}</p>
    <p>by: {owner}</p>
    {actions}
</li>
"#,
                name = escape(&task.task_name),
                urgent = urgent,
                category = escape(&task.category_name),
                due = escape(&task.due_date),
                description = escape(&task.task_description),
                owner = escape(&task.owner_username),
                actions = actions
            )
        })
        .collect();

    format!("<h2>All Tasks</h2>\n<ul class=\"tasks\">\n{}</ul>", items)
}

/// Browsers compile `pattern` with the `v` flag, where a bare `-` inside a class is
/// a syntax error, so the hyphen is escaped.
const USERNAME_PATTERN: &str = r#" pattern="[a-zA-Z0-9_\-]+""#;

fn credentials_form(heading: &str, action: &str, button: &str, pattern: &str) -> String {
    format!(
        r#"<h2>{heading}</h2>
<form method="POST" action="{action}">
    <label for="username">Username</label>
    <input id="username" name="username" type="text"{pattern} required>
    <label for="password">Password</label>
    <input id="password" name="password" type="password" required>
    <button type="submit">{button}</button>
</form>"#,
        heading = heading,
        action = action,
        button = button,
        pattern = pattern
    )
}

pub fn register_form() -> String {
    credentials_form("Register", "/register", "Register", USERNAME_PATTERN)
}

// Existing accounts are looked up case-insensitively, so the login form takes any text.
pub fn login_form() -> String {
    credentials_form("Log In", "/login", "Log In", "")
}

pub fn profile(username: &str) -> String {
    format!(
        "<h2>{}'s Profile</h2>\n<p><a href=\"/add_task\">Add a task</a></p>",
        escape(username)
    )
}

/// The add/edit form. `current` prefills the inputs when editing.
pub fn task_form(
    heading: &str,
    action: &str,
    categories: &[Category],
    current: Option<&TaskFields>,
) -> String {
    let selected_category = current.map(|f| f.category_name.as_str());
    let options: String = categories
        .iter()
        .map(|category| {
            let selected = if selected_category == Some(category.category_name.as_str()) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{name}"{selected}>{name}</option>"#,
                name = escape(&category.category_name),
                selected = selected
            )
        })
        .collect();

    let task_name = current.map(|f| escape(&f.task_name)).unwrap_or_default();
    let task_description = current
        .map(|f| escape(&f.task_description))
        .unwrap_or_default();
    let due_date = current.map(|f| escape(&f.due_date)).unwrap_or_default();
    let checked = if current.map_or(false, |f| f.is_urgent) {
        " checked"
    } else {
        ""
    };

    format!(
        r#"<h2>{heading}</h2>
<form method="POST" action="{action}">
    <label for="category_name">Category</label>
    <select id="category_name" name="category_name" required>
        <option value="" disabled{placeholder}>Choose Category</option>
        {options}
    </select>
    <label for="task_name">Task Name</label>
    <input id="task_name" name="task_name" type="text" value="{task_name}" required>
    <label for="task_description">Task Description</label>
    <textarea id="task_description" name="task_description">{task_description}</textarea>
    <label for="due_date">Due Date</label>
    <input id="due_date" name="due_date" type="text" class="datepicker" value="{due_date}" required>
    <label><input name="is_urgent" type="checkbox"{checked}> Is Urgent</label>
    <button type="submit">Save Task</button>
</form>"#,
        heading = escape(heading),
        action = escape(action),
        placeholder = if selected_category.is_none() { " selected" } else { "" },
        options = options,
        task_name = task_name,
        task_description = task_description,
        due_date = due_date,
        checked = checked
    )
}

pub fn category_list(categories: &[Category]) -> String {
    let items: String = categories
        .iter()
        .map(|category| format!("<li>{}</li>\n", escape(&category.category_name)))
        .collect();
    format!(
        "<h2>Categories</h2>\n<p><a href=\"/add_category\">Add Category</a></p>\n<ul class=\"categories\">\n{}</ul>",
        items
    )
}

pub fn category_form() -> String {
    r#"<h2>Add Category</h2>
<form method="POST" action="/add_category">
    <label for="category_name">Category Name</label>
    <input id="category_name" name="category_name" type="text" required>
    <button type="submit">Add Category</button>
</form>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(owner: &str) -> Task {
        Task {
            id: "abc".to_string(),
            category_name: "Work".to_string(),
            task_name: "<script>".to_string(),
            task_description: String::new(),
            due_date: "01 January, 2024".to_string(),
            is_urgent: true,
            owner_username: owner.to_string(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }

    #[test]
    fn task_list_escapes_and_hides_links_from_others() {
        let tasks = vec![task("alice")];
        let html = task_list(&tasks, Some("bob"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Urgent!"));
        assert!(!html.contains("/edit_task/abc"));

        let html = task_list(&tasks, Some("alice"));
        assert!(html.contains("/edit_task/abc"));
        assert!(html.contains("/delete_task/abc"));
    }

    #[test]
    fn username_pattern_escapes_the_hyphen() {
        let html = register_form();
        assert!(html.contains(r#"pattern="[a-zA-Z0-9_\-]+""#));
        assert!(!html.contains("_-]"));
        assert!(!login_form().contains("pattern="));
    }

    #[test]
    fn edit_form_is_prefilled() {
        let categories = vec![
            Category {
                id: "1".to_string(),
                category_name: "Home".to_string(),
            },
            Category {
                id: "2".to_string(),
                category_name: "Work".to_string(),
            },
        ];
        let fields = task("alice").fields();
        let html = task_form("Edit Task", "/edit_task/abc", &categories, Some(&fields));
        assert!(html.contains(r#"<option value="Work" selected>"#));
        assert!(html.contains(r#"value="01 January, 2024""#));
        assert!(html.contains(" checked>"));
    }
}
