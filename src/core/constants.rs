//! Fixed user-facing texts and protocol defaults shared across the application

/// Capability description returned for `/help` without any network call.
pub const HELP_TEXT: &str =
    "Commandes disponibles : /help, /wiki <terme>. Pour le reste, tu peux discuter !";

/// Persona sent as the system instruction of every generation request.
pub const SYSTEM_INSTRUCTION: &str = "Tu es un assistant IA amical et concis, conçu pour le chat en français. Réponds aux questions de manière utile et engageante, en utilisant des emojis si approprié.";

/// Extra grounding query appended when the input looks non-English.
pub const SEARCH_HINT: &str = "french chat assistant response";

/// Reply used when the generation succeeded but carried no text.
pub const EMPTY_RESULT_TEXT: &str =
    "Je n'ai pas pu générer de réponse pour cette requête. Peut-être essayer différemment ?";

/// Reply used for every dispatcher failure.
pub const COMMUNICATION_ERROR_TEXT: &str =
    "Désolé, une erreur de communication avec l'IA est survenue. Peux-tu réessayer dans un instant ?";

/// Greeting shown when an interactive session starts.
pub const WELCOME_TEXT: &str = "🤖 Bonjour ! Je suis ton assistant de chat IA propulsé par Gemini. Pose-moi une question ou utilise /help.";

pub const USER_PREFIX: &str = "👤";
pub const ASSISTANT_PREFIX: &str = "🤖";

/// Summary extracts longer than this many characters are cut.
pub const SUMMARY_MAX_CHARS: usize = 400;
pub const SUMMARY_TRUNCATION_MARKER: &str = "… (plus sur Wikipédia)";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const DEFAULT_GENERATION_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SUMMARY_BASE_URL: &str = "https://fr.wikipedia.org/api/rest_v1";

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_JITTER_MS: u64 = 1000;
pub const DEFAULT_CHAR_DELAY_MS: u64 = 25;
pub const DEFAULT_PAUSE_DELAY_MS: u64 = 100;

pub fn not_found_text(term: &str) -> String {
    format!("Impossible de trouver une page Wikipédia pour \"{term}\".")
}
