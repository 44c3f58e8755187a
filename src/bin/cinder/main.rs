// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The `cinder` command line tool.

use std::io;

use cinderclient::shell;

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut logger = env_logger::Builder::from_default_env();
    if shell::debug_requested(&args, &env_lookup) {
        let _ = logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("ERROR: Cannot start the runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(shell::main_with(
        args,
        &env_lookup,
        &mut io::stdout(),
        &mut io::stderr(),
    ));
    std::process::exit(code);
}
