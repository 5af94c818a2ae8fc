mod play_game;
