use rocket::serde::json::Json;
use rocket::State;

use crate::context::Context;
use crate::data::category::db::{CategoryDbExt, CategoryPage, CategoryPageData, CreateCategoryData};
use crate::data::category::Category;
use crate::resp::jwt::Admin;
use crate::resp::problem::{problems, Problem};
use crate::resp::{Data, Empty, Reply};

/// Create a category
#[utoipa::path(
    request_body = CreateCategoryData,
    responses(
        (status = 200, description = "Category created"),
        (status = 400, description = "Missing name", body = Problem),
        (status = 401, description = "Not an admin", body = Problem),
    ),
    security(("jwt" = []), ("token_cookie" = []))
)]
#[post("/categories", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn category_create(
    data: Json<CreateCategoryData>,
    _admin: Admin,
    ctx: &State<Context>,
) -> Result<Json<Reply<Empty>>, Problem> {
    ctx.create_category(data.into_inner()).await?;
    Ok(Json(Reply::ok("Category Created Successfully")))
}

/// List all categories
#[utoipa::path(responses((status = 200, description = "Every category")))]
#[get("/categories")]
#[tracing::instrument(skip(ctx))]
pub async fn category_list(ctx: &State<Context>) -> Result<Json<Reply<Data<Vec<Category>>>>, Problem> {
    Ok(Json(Reply::data(ctx.list_categories().await?)))
}

/// Courses of a category, a related category and the best sellers
#[utoipa::path(
    request_body = CategoryPageData,
    responses(
        (status = 200, description = "Category page"),
        (status = 404, description = "Unknown category or no published courses", body = Problem),
    )
)]
#[post("/categories/page", format = "json", data = "<data>")]
#[tracing::instrument(skip(ctx))]
pub async fn category_page(
    data: Json<CategoryPageData>,
    ctx: &State<Context>,
) -> Result<Json<Reply<Data<CategoryPage>>>, Problem> {
    let id = data.category_id.ok_or_else(problems::missing_fields)?;
    Ok(Json(Reply::data(ctx.category_page_details(&id).await?)))
}
