use sea_orm::{
    ColumnTrait, Condition, IntoSimpleExpr,
    sea_query::{Expr, Func, LikeExpr},
};

pub mod addon_service;
pub mod auth_service;
pub mod category_service;
pub mod image_service;
pub mod menu_service;
pub mod product_service;

/// Case-insensitive substring match of `term` on either column.
pub(crate) fn search_condition<C: ColumnTrait>(name: C, description: C, term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    Condition::any()
        .add(contains(name, &pattern))
        .add(contains(description, &pattern))
}

fn contains<C: ColumnTrait>(column: C, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(column.into_simple_expr()))
        .like(LikeExpr::new(pattern).escape('\\'))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
