//! Interactive GTK4 front-end.

mod window;

use std::rc::Rc;

use anyhow::Result;
use gtk4::prelude::*;
use gtk4::Application;
use tracing::error;

use crate::cli::RunArgs;

const APP_ID: &str = "com.imscroll.Strip";

pub fn run(args: RunArgs) -> Result<()> {
    let app = Application::builder().application_id(APP_ID).build();
    let args = Rc::new(args);

    app.connect_activate(move |app| {
        if let Err(e) = window::present(app, &args) {
            error!(error = ?e, "Failed to open scroller window");
            app.quit();
        }
    });

    // Our flags are already parsed; keep GTK from interpreting them.
    app.run_with_args::<&str>(&[]);
    Ok(())
}
