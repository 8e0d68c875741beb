use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{error, info};

use serde::Deserialize;
use text_gen_core::{Model, ModelConfig, ModelError, ModelState};

/// Server options, read from the command line or the environment.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	#[arg(long, env = "TEXT_GEN_HOST", default_value = "127.0.0.1")]
	host: String,

	#[arg(long, env = "TEXT_GEN_PORT", default_value_t = 5000)]
	port: u16,

	/// Largest number of words grouped together.
	#[arg(long, env = "TEXT_GEN_WORDS_TOGETHER", default_value_t = 3)]
	words_together: usize,

	/// Optional text file learned at startup (one sentence per line).
	#[arg(long, env = "TEXT_GEN_DATA")]
	data: Option<String>,
}

/// Largest JSON state accepted by `PUT /v1/state`.
const MAX_STATE_BYTES: usize = 64 * 1024 * 1024;

/// Largest `count` accepted by `/v1/generate`.
const MAX_COUNT: usize = 1024;

/// Largest `sentences` accepted by `/v1/generate`.
const MAX_SENTENCES: usize = 100;

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	sentences: Option<usize>,
}

/// Generation only reads the model, so generators share the read lock.
struct SharedData {
	model: RwLock<Model>,
}

fn model_error(e: ModelError) -> HttpResponse {
	match e {
		ModelError::InvalidArgument(_) => HttpResponse::BadRequest().body(e.to_string()),
		ModelError::EmptyModel | ModelError::EmptyDistribution { .. } => HttpResponse::Conflict().body(e.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `sentences` sentences of `count` tokens, one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(8);
	let sentences = query.sentences.unwrap_or(1);
	if count > MAX_COUNT {
		return HttpResponse::BadRequest().body(format!("count must be <= {MAX_COUNT}"));
	}
	if sentences > MAX_SENTENCES {
		return HttpResponse::BadRequest().body(format!("sentences must be <= {MAX_SENTENCES}"));
	}

	let model = match data.model.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut rng = rand::rng();
	let mut generated = Vec::with_capacity(sentences);
	for _ in 0..sentences {
		match model.generate_sentence_with(count, &mut rng) {
			Ok(sentence) => generated.push(sentence),
			Err(e) => return model_error(e),
		}
	}

	HttpResponse::Ok().body(generated.join("\n"))
}

/// HTTP PUT endpoint `/v1/learn`
///
/// Learns every line of the body as a sentence.
#[put("/v1/learn")]
async fn put_learn(data: web::Data<SharedData>, body: String) -> impl Responder {
	let mut model = match data.model.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut learned = 0;
	for line in body.lines() {
		model.learn_from_sentence(line);
		learned += 1;
	}

	HttpResponse::Ok().body(format!("{learned}"))
}

#[get("/v1/state")]
async fn get_state(data: web::Data<SharedData>) -> impl Responder {
	match data.model.read() {
		Ok(model) => HttpResponse::Ok().json(model.export_state()),
		Err(_) => HttpResponse::InternalServerError().body("Model lock failed"),
	}
}

/// Replaces the whole learned state, no merging.
#[put("/v1/state")]
async fn put_state(data: web::Data<SharedData>, state: web::Json<ModelState>) -> impl Responder {
	let mut model = match data.model.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	model.import_state(state.into_inner());
	HttpResponse::Ok().body("State imported successfully")
}

#[get("/v1/granularities")]
async fn get_granularities(data: web::Data<SharedData>) -> impl Responder {
	let model = match data.model.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let granularities: Vec<String> = model.granularities().map(|k| k.to_string()).collect();
	HttpResponse::Ok().body(granularities.join("\n"))
}

/// Registers every endpoint of the service.
fn configure(cfg: &mut web::ServiceConfig) {
	cfg.app_data(web::JsonConfig::default().limit(MAX_STATE_BYTES))
		.service(get_generated)
		.service(put_learn)
		.service(get_state)
		.service(put_state)
		.service(get_granularities);
}

/// Main entry point for the server.
///
/// Builds the model (optionally from a data file), wraps it in a `RwLock`
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let args = Args::parse();

	let config = ModelConfig::new(args.words_together)
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
	let model = match &args.data {
		Some(path) => Model::from_file(path, &config).map_err(|e| {
			error!("failed to load {path}: {e}");
			std::io::Error::other(e)
		})?,
		None => Model::from_config(&config).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?,
	};

	let shared_data = web::Data::new(SharedData { model: RwLock::new(model) });

	info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.configure(configure)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
