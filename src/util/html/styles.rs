//! 页面CSS样式

pub fn base_css() -> &'static str {
    r#"
        body {
            font-family: 'Segoe UI', Arial, sans-serif;
            margin: 0;
            background: #f3f8f7;
            color: #233;
            line-height: 1.5;
        }
        nav {
            display: flex;
            gap: 16px;
            align-items: center;
            padding: 12px 24px;
            background: #0f6e63;
            color: #fff;
        }
        nav a { color: #fff; text-decoration: none; }
        nav .brand { font-weight: bold; font-size: 1.2em; margin-right: auto; }
        main { max-width: 960px; margin: 24px auto; padding: 0 16px; }
        .card {
            background: #fff;
            border: 1px solid #dde8e6;
            border-radius: 8px;
            padding: 20px;
            margin-bottom: 20px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.04);
        }
        .flash {
            padding: 10px 14px;
            margin-bottom: 12px;
            border-radius: 6px;
            background: #fff6d6;
            border: 1px solid #f0d77a;
        }
        label { display: block; margin: 10px 0 4px; font-weight: 600; }
        input[type=text], input[type=password], input[type=file] {
            width: 100%;
            padding: 8px;
            box-sizing: border-box;
        }
        button {
            margin-top: 14px;
            padding: 8px 18px;
            border: 0;
            border-radius: 6px;
            background: #0f6e63;
            color: #fff;
            cursor: pointer;
        }
        button:disabled { background: #9bb; cursor: default; }
        table { border-collapse: collapse; width: 100%; background: #fff; }
        th, td { padding: 8px 10px; border: 1px solid #dde8e6; text-align: left; vertical-align: middle; }
        th { background: #e7f2f0; }
        img.thumb { width: 96px; height: 72px; object-fit: cover; border-radius: 4px; }
        .category-Polluted { color: #b3261e; font-weight: bold; }
        .category-Clean { color: #1b7a3a; font-weight: bold; }
        .status-Done { color: #1b7a3a; }
        .status-Pending { color: #a36b00; }
        .points { font-size: 2em; font-weight: bold; color: #0f6e63; }
        #result { margin-top: 16px; }
        #result.error { color: #b91c1c; }
        .empty { color: #789; font-style: italic; }
    "#
}
