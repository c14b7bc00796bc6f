use super::{Cell, Machine, BUILTIN_FLAG};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

pub type BuiltinCode = fn(&mut Machine) -> Result<()>;

/// A host primitive: dictionary name, code, and the stack-effect line
/// shown by `dump` tooling.
pub struct Builtin {
    pub name: &'static str,
    pub code: BuiltinCode,
    pub doc: &'static str,
}

/// Registration. Each primitive gets a slot in the builtin table and a
/// dictionary entry whose code field carries the slot index under
/// BUILTIN_FLAG, so `find` treats builtins like any other word.
impl Machine {
    fn add(&mut self, name: &'static str, code: BuiltinCode, doc: &'static str) -> Result<()> {
        let index = self.builtins.len();
        self.builtins.push(Builtin { name, code, doc });
        let cfa = index as u64 | BUILTIN_FLAG;
        self.make_word(name, &[cfa as Cell])?;
        Ok(())
    }

    fn add_immediate(
        &mut self,
        name: &'static str,
        code: BuiltinCode,
        doc: &'static str,
    ) -> Result<()> {
        self.add(name, code, doc)?;
        self.f_immediate()
    }

    pub(crate) fn register_builtins(&mut self) -> Result<()> {
        // arithmetic and comparison
        self.add("+", Machine::f_plus, "+ ( a b -- a+b )")?;
        self.add("-", Machine::f_minus, "- ( a b -- a-b )")?;
        self.add("*", Machine::f_times, "* ( a b -- a*b )")?;
        self.add("/", Machine::f_divide, "/ ( a b -- a/b )")?;
        self.add("mod", Machine::f_mod, "mod ( a b -- rem )")?;
        self.add("/mod", Machine::f_slash_mod, "/mod ( a b -- rem quot )")?;
        self.add("negate", Machine::f_negate, "negate ( n -- -n )")?;
        self.add("abs", Machine::f_abs, "abs ( n -- |n| )")?;
        self.add("min", Machine::f_min, "min ( a b -- min )")?;
        self.add("max", Machine::f_max, "max ( a b -- max )")?;
        self.add("1+", Machine::f_one_plus, "1+ ( n -- n+1 )")?;
        self.add("1-", Machine::f_one_minus, "1- ( n -- n-1 )")?;
        self.add("=", Machine::f_equal, "= ( a b -- f )")?;
        self.add("<>", Machine::f_not_equal, "<> ( a b -- f )")?;
        self.add("<", Machine::f_less, "< ( a b -- f )")?;
        self.add(">", Machine::f_greater, "> ( a b -- f )")?;
        self.add("0=", Machine::f_0equal, "0= ( n -- f )")?;
        self.add("0<", Machine::f_0less, "0< ( n -- f )")?;
        self.add("0>", Machine::f_0greater, "0> ( n -- f )")?;
        self.add("0<>", Machine::f_0not_equal, "0<> ( n -- f )")?;
        self.add("and", Machine::f_and, "and ( a b -- a&b )")?;
        self.add("or", Machine::f_or, "or ( a b -- a|b )")?;
        self.add("xor", Machine::f_xor, "xor ( a b -- a^b )")?;
        self.add("invert", Machine::f_invert, "invert ( n -- ~n )")?;
        self.add("not", Machine::f_invert, "not ( n -- ~n )")?;
        self.add("lshift", Machine::f_lshift, "lshift ( v n -- v<<n )")?;
        self.add("rshift", Machine::f_rshift, "rshift ( v n -- v>>n ) logical")?;
        self.add("true", Machine::f_true, "true ( -- -1 )")?;
        self.add("false", Machine::f_false, "false ( -- 0 )")?;

        // stack
        self.add("dup", Machine::f_dup, "dup ( n -- n n )")?;
        self.add("drop", Machine::f_drop, "drop ( n -- )")?;
        self.add("swap", Machine::f_swap, "swap ( a b -- b a )")?;
        self.add("over", Machine::f_over, "over ( a b -- a b a )")?;
        self.add("rot", Machine::f_rot, "rot ( a b c -- b c a )")?;
        self.add("-rot", Machine::f_minus_rot, "-rot ( a b c -- c a b )")?;
        self.add("nip", Machine::f_nip, "nip ( a b -- b )")?;
        self.add("tuck", Machine::f_tuck, "tuck ( a b -- b a b )")?;
        self.add("?dup", Machine::f_q_dup, "?dup ( n -- n n | 0 )")?;
        self.add("pick", Machine::f_pick, "pick ( .. n -- .. v ) 0-indexed")?;
        self.add("roll", Machine::f_roll, "roll ( .. n -- .. v ) 0-indexed")?;
        self.add("depth", Machine::f_depth, "depth ( -- n )")?;
        self.add("clear", Machine::f_clear, "clear ( ... -- )")?;
        self.add(".s", Machine::f_dot_s, ".s ( -- ) print the stack")?;

        // return stack
        self.add(">r", Machine::f_to_r, ">r ( n -- )")?;
        self.add("r>", Machine::f_r_from, "r> ( -- n )")?;
        self.add("r@", Machine::f_r_fetch, "r@ ( -- n )")?;
        self.add("rdrop", Machine::f_r_drop, "rdrop ( -- )")?;
        self.add("i", Machine::f_i, "i ( -- n ) innermost loop count")?;
        self.add("j", Machine::f_j, "j ( -- n ) enclosing loop count")?;

        // memory
        self.add("@", Machine::f_fetch, "@ ( a -- v )")?;
        self.add("!", Machine::f_store, "! ( v a -- )")?;
        self.add("+!", Machine::f_plus_store, "+! ( n a -- )")?;
        self.add("c@", Machine::f_c_fetch, "c@ ( s -- c )")?;
        self.add("c!", Machine::f_c_store, "c! ( c s -- )")?;
        self.add(",", Machine::f_comma, ", ( v -- ) append to the dictionary")?;
        self.add("allot", Machine::f_allot, "allot ( n -- ) reserve n cells")?;
        self.add("s-create", Machine::f_s_create, "s-create ( s1 -- s2 )")?;
        self.add("s-copy", Machine::f_s_copy, "s-copy ( src dest -- )")?;

        // dictionary
        self.add("create", Machine::f_create, "create <name> ( -- )")?;
        self.add("'", Machine::f_tick, "' <name> ( -- cfa )")?;
        self.add("(')", Machine::f_tick_p, "(') <name> ( -- cfa | 0 )")?;
        self.add("find", Machine::f_find, "find ( s -- cfa T | s F )")?;
        self.add("?unique", Machine::f_q_unique, "?unique ( s -- s )")?;
        self.add("immediate", Machine::f_immediate_word, "immediate ( -- )")?;
        self.add("immed?", Machine::f_immediate_q, "immed? ( cfa -- f )")?;
        self.add("(close)", Machine::f_close_p, "(close) ( -- ) finish the open entry")?;
        self.add("builtin-name", Machine::f_builtin_name, "builtin-name ( n -- s )")?;
        self.add("forget", Machine::f_forget, "forget <name> ( -- )")?;
        self.add("forget-last", Machine::f_forget_last, "forget-last ( -- )")?;
        self.add("words", Machine::f_words, "words ( -- ) list the dictionary")?;
        self.add("dump", Machine::f_dump, "dump ( a u -- ) print u cells at a")?;

        // defining words
        self.add(":", Machine::f_colon, ": <name> ( -- ) open a definition")?;
        self.add_immediate(";", Machine::f_semicolon, "; ( -- ) close a definition")?;
        self.add("variable", Machine::f_variable, "variable <name> ( -- )")?;
        self.add("constant", Machine::f_constant, "constant <name> ( n -- )")?;
        self.add("array", Machine::f_array, "array <name> ( n -- )")?;

        // parser and compiler
        self.add("parse-to", Machine::f_parse_to, "parse-to ( b c -- b u )")?;
        self.add("(parse)", Machine::f_parse_p, "(parse) ( b u c -- b u delta )")?;
        self.add("number?", Machine::f_number_q, "number? ( s -- n T | s F )")?;
        self.add("eval", Machine::f_eval, "eval ( -- ) interpret the rest of the TIB")?;
        self.add("query", Machine::f_query, "query ( -- ) read a line into the TIB")?;
        self.add("accept", Machine::f_accept, "accept ( b u -- b u2 )")?;
        self.add("include-file", Machine::f_include_file, "include-file ( s -- f )")?;
        self.add("include", Machine::f_include, "include <name> ( -- )")?;
        self.add("open-file", Machine::f_open_file, "open-file ( s fam -- file-id ior )")?;
        self.add("close-file", Machine::f_close_file, "close-file ( file-id -- ior )")?;
        self.add("read-line", Machine::f_read_line, "read-line ( u file-id -- u2 flag ior )")?;
        self.add("write-line", Machine::f_write_line, "write-line ( s u file-id -- ior )")?;
        self.add(
            "file-position",
            Machine::f_file_position,
            "file-position ( file-id -- u ior )",
        )?;
        self.add("file-size", Machine::f_file_size, "file-size ( file-id -- u ior )")?;
        self.add(">c", Machine::f_to_c, ">c ( a tag -- ) control-stack push")?;
        self.add("c>", Machine::f_from_c, "c> ( -- a ) control-stack pop")?;

        // control flow
        self.add_immediate("if", Machine::f_if, "if ( f -- at run time )")?;
        self.add_immediate("else", Machine::f_else, "else ( -- )")?;
        self.add_immediate("then", Machine::f_then, "then ( -- )")?;
        self.add_immediate("begin", Machine::f_begin, "begin ( -- )")?;
        self.add_immediate("until", Machine::f_until, "until ( f -- at run time )")?;
        self.add_immediate("again", Machine::f_again, "again ( -- )")?;
        self.add_immediate("while", Machine::f_while, "while ( f -- at run time )")?;
        self.add_immediate("repeat", Machine::f_repeat, "repeat ( -- )")?;
        self.add_immediate("for", Machine::f_for, "for ( n -- at run time )")?;
        self.add_immediate("next", Machine::f_next, "next ( -- )")?;
        self.add_immediate("case", Machine::f_case, "case ( n -- at run time )")?;
        self.add_immediate("of", Machine::f_of, "of ( n -- at run time )")?;
        self.add_immediate("endof", Machine::f_endof, "endof ( -- )")?;
        self.add_immediate("endcase", Machine::f_endcase, "endcase ( -- )")?;

        // literals and comments
        self.add_immediate("s\"", Machine::f_s_quote, "s\" ...\" ( -- s )")?;
        self.add_immediate(".\"", Machine::f_dot_quote, ".\" ...\" ( -- )")?;
        self.add_immediate("abort\"", Machine::f_abort_quote, "abort\" ...\" ( -- )")?;
        self.add_immediate("\\", Machine::f_backslash, "\\ ( -- ) line comment")?;
        self.add_immediate("(", Machine::f_paren, "( ...) ( -- ) comment")?;

        // terminal i/o
        self.add("key", Machine::f_key, "key ( -- c )")?;
        self.add("key?", Machine::f_key_q, "key? ( -- f ) poll, raw mode required")?;
        self.add("(emit)", Machine::f_emit_p, "(emit) ( c -- ) unfiltered")?;
        self.add("emit", Machine::f_emit, "emit ( c -- )")?;
        self.add("type", Machine::f_type, "type ( s -- ) print a counted string")?;
        self.add(".", Machine::f_dot, ". ( n -- ) print in the current base")?;
        self.add("u.", Machine::f_u_dot, "u. ( u -- ) print unsigned")?;
        self.add("cr", Machine::f_cr, "cr ( -- )")?;
        self.add("space", Machine::f_space, "space ( -- )")?;
        self.add("flush", Machine::f_flush, "flush ( -- )")?;
        self.add("raw-mode-on", Machine::f_raw_mode_on, "raw-mode-on ( -- )")?;
        self.add("raw-mode-off", Machine::f_raw_mode_off, "raw-mode-off ( -- )")?;
        self.add("raw-mode?", Machine::f_raw_mode_q, "raw-mode? ( -- f )")?;
        self.add("ms", Machine::f_ms, "ms ( n -- ) sleep n milliseconds")?;
        self.add("now", Machine::f_now, "now ( -- ) start the timer")?;
        self.add("millis", Machine::f_millis, "millis ( -- n ) since now")?;
        self.add("micros", Machine::f_micros, "micros ( -- n ) since now")?;
        self.add("(system)", Machine::f_system_p, "(system) ( s -- ) shell out")?;

        // debug and meta
        self.add("dbg", Machine::f_dbg, "dbg ( n -- ) set the diagnostic level")?;
        self.add("debuglevel", Machine::f_debuglevel, "debuglevel ( -- )")?;
        self.add("show-stack", Machine::f_show_stack, "show-stack ( -- )")?;
        self.add("hide-stack", Machine::f_hide_stack, "hide-stack ( -- )")?;
        self.add("execute", Machine::f_execute, "execute ( cfa -- )")?;
        self.add("abort", Machine::f_abort, "abort ( -- )")?;
        self.add("bye", Machine::f_bye, "bye ( -- )")?;
        Ok(())
    }

    /// immediate as a word; the host method is used during registration.
    fn f_immediate_word(&mut self) -> Result<()> {
        self.f_immediate()
    }

    /// (close) as a word.
    fn f_close_p(&mut self) -> Result<()> {
        self.close_word()
    }
}
