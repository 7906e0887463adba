use course_core::model::{ModuleId, UserId};
use services::AppServices;

pub async fn complete(app: &AppServices, user: &UserId, module: ModuleId) -> anyhow::Result<()> {
    app.progression().complete_module(user, module).await?;
    println!("module {module} completed");
    Ok(())
}

pub async fn time(
    app: &AppServices,
    user: &UserId,
    module: ModuleId,
    minutes: u32,
) -> anyhow::Result<()> {
    let progress = app.progression().record_time(user, module, minutes).await?;
    println!(
        "module {module}: {} min studied",
        progress.time_spent_minutes()
    );
    Ok(())
}
