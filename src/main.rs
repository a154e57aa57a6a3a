use std::io::Write;

use riverclean_server::server;

fn usage() {
    eprintln!("用法: riverclean-server [serve | health-check | grant-admin <username>]");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s
        } else {
            "Unknown panic payload"
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        eprintln!("[PANIC] 程序异常退出");
        eprintln!("位置: {}", location);
        eprintln!("原因: {}", message);

        tracing::error!(event = "panic.raised", location = %location, reason = %message);

        let panic_msg = format!(
            "PANIC OCCURRED\nLocation: {}\nReason: {}\nTime: {}\n\n",
            location,
            message,
            chrono::Utc::now()
        );

        if let Err(e) = std::fs::write("./panic.log", &panic_msg) {
            eprintln!("[WARN] 无法写入panic.log: {}", e);
        } else {
            eprintln!("[OK] Panic信息已保存到 ./panic.log");
        }

        std::io::stderr().flush().ok();
    }));

    let mut args = std::env::args();
    let _ = args.next();

    match args.next().as_deref() {
        None | Some("serve") => server::start_server().await,
        Some("health-check") | Some("--health-check") => {
            let health = server::check_system_health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            if !health.all_healthy() {
                std::process::exit(1);
            }
            Ok(())
        }
        Some("grant-admin") => match args.next() {
            Some(username) => {
                server::grant_admin(&username).await?;
                println!("已授予 {} 管理员权限，重新登录后生效", username);
                Ok(())
            }
            None => {
                usage();
                std::process::exit(2);
            }
        },
        Some(other) => {
            eprintln!("未知命令: {}", other);
            usage();
            std::process::exit(2);
        }
    }
}
