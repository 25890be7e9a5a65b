use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::session::{Session, Submitted};
use crate::task::{TaskFields, TaskForm};
use crate::views;
use crate::{login, register, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(get_tasks))
        .route("/get_tasks", web::get().to(get_tasks))
        .route("/register", web::get().to(register::register_form))
        .route("/register", web::post().to(register::register_user))
        .route("/login", web::get().to(login::login_form))
        .route("/login", web::post().to(login::login_user))
        .route("/profile/{username}", web::get().to(login::profile))
        .route("/profile/{username}", web::post().to(login::profile))
        .route("/logout", web::get().to(login::logout))
        .route("/add_task", web::get().to(add_task_form))
        .route("/add_task", web::post().to(add_task))
        .route("/edit_task/{task_id}", web::get().to(edit_task_form))
        .route("/edit_task/{task_id}", web::post().to(edit_task))
        .route("/delete_task/{task_id}", web::get().to(delete_task))
        .route("/show_categories", web::get().to(show_categories))
        .route("/add_category", web::get().to(add_category_form))
        .route("/add_category", web::post().to(add_category));
}

async fn get_tasks(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let tasks = state.tasks.list_all().await?;
    let body = views::task_list(&tasks, session.current());
    Ok(session.render("Tasks", &body))
}

async fn add_task_form(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    session.require()?;
    let categories = state.categories.list().await?;
    let body = views::task_form("Add Task", "/add_task", &categories, None);
    Ok(session.render("Add Task", &body))
}

async fn add_task(
    state: web::Data<AppState>,
    mut session: Session,
    form: Submitted<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require()?;
    let form = match form {
        Ok(form) => form.into_inner(),
        Err(err) => return Ok(session.reject_form(&err, "/add_task")),
    };
    let task = state
        .tasks
        .create(TaskFields::from(form), &identity)
        .await?;

    log::info!("{} added task {}", identity.username(), task.id);
    session.flash("Task Successfully Added");
    Ok(session.redirect("/get_tasks"))
}

async fn edit_task_form(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require()?;
    let task = state.tasks.get(&path).await?;
    state.task_access.authorize(&identity, &task)?;

    let categories = state.categories.list().await?;
    let action = format!("/edit_task/{}", task.id);
    let body = views::task_form("Edit Task", &action, &categories, Some(&task.fields()));
    Ok(session.render("Edit Task", &body))
}

async fn edit_task(
    state: web::Data<AppState>,
    mut session: Session,
    path: web::Path<String>,
    form: Submitted<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require()?;
    let existing = state.tasks.get(&path).await?;
    state.task_access.authorize(&identity, &existing)?;

    let form = match form {
        Ok(form) => form.into_inner(),
        Err(err) => {
            let back = format!("/edit_task/{}", existing.id);
            return Ok(session.reject_form(&err, &back));
        }
    };
    let task = state
        .tasks
        .update(&existing.id, TaskFields::from(form), &identity)
        .await?;
    log::info!("{} updated task {}", identity.username(), task.id);

    let categories = state.categories.list().await?;
    let action = format!("/edit_task/{}", task.id);
    let body = views::task_form("Edit Task", &action, &categories, Some(&task.fields()));
    session.flash("Task Successfully Updated");
    Ok(session.render("Edit Task", &body))
}

async fn delete_task(
    state: web::Data<AppState>,
    mut session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require()?;
    let task = state.tasks.get(&path).await?;
    state.task_access.authorize(&identity, &task)?;

    state.tasks.delete(&task.id).await?;
    log::info!("{} deleted task {}", identity.username(), task.id);
    session.flash("Task Successfully Deleted");
    Ok(session.redirect("/get_tasks"))
}

async fn show_categories(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let categories = state.categories.list().await?;
    Ok(session.render("Categories", &views::category_list(&categories)))
}

#[derive(Deserialize)]
pub struct CategoryForm {
    pub category_name: String,
}

async fn add_category_form(session: Session) -> Result<HttpResponse, AppError> {
    session.require()?;
    Ok(session.render("Add Category", &views::category_form()))
}

async fn add_category(
    state: web::Data<AppState>,
    mut session: Session,
    form: Submitted<CategoryForm>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require()?;
    let form = match form {
        Ok(form) => form.into_inner(),
        Err(err) => return Ok(session.reject_form(&err, "/add_category")),
    };
    let category = state.categories.create(form.category_name.trim()).await?;

    log::info!(
        "{} added category {}",
        identity.username(),
        category.category_name
    );
    session.flash("New Category Added");
    Ok(session.redirect("/show_categories"))
}
