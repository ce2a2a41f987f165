use askama::Template;

use crate::error::{Result, TodoWebError};
use crate::flash::FlashMessage;
use crate::todo::Todo;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub flashes: &'a [FlashMessage],
    pub todos: &'a [Todo],
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditPage<'a> {
    pub flashes: &'a [FlashMessage],
    pub todo: &'a Todo,
}

pub fn render<T: Template>(page: &T) -> Result<String> {
    page.render().map_err(|e| TodoWebError::Template(e.to_string()))
}
